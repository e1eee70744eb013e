use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::repository::TrackingMessageProducer;
use crate::scenario_event_generator::ScenarioEventGenerator;
use crate::types::{IdentifyTrackingsInput, IdentifyTrackingsOutput, PublishTrackingInput};

/// Domain service that synthesizes future tracking events for a shipment and enqueues them
///
/// Flow:
/// 1. Check the trackings queue is configured and the shipment id is present
/// 2. Pick the scenario (pinned by the caller or drawn at random)
/// 3. Generate the ordered event sequence
/// 4. Publish all events as one batch message
pub struct TrackingIdentificationService {
    producer: Arc<dyn TrackingMessageProducer>,
    generator: Arc<ScenarioEventGenerator>,
    clock: Arc<dyn Clock>,
    trackings_queue: Option<String>,
}

impl TrackingIdentificationService {
    pub fn new(
        producer: Arc<dyn TrackingMessageProducer>,
        generator: Arc<ScenarioEventGenerator>,
        clock: Arc<dyn Clock>,
        trackings_queue: Option<String>,
    ) -> Self {
        Self {
            producer,
            generator,
            clock,
            trackings_queue,
        }
    }

    #[instrument(skip(self), fields(shipment_id = ?input.shipment_id))]
    pub async fn identify_new_trackings(
        &self,
        input: IdentifyTrackingsInput,
    ) -> DomainResult<IdentifyTrackingsOutput> {
        let queue = self
            .trackings_queue
            .clone()
            .filter(|queue| !queue.is_empty())
            .ok_or_else(|| {
                DomainError::MissingConfiguration("trackings queue is not configured".to_string())
            })?;

        let shipment_id = input
            .shipment_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DomainError::InvalidShipmentId("shipmentId is required".to_string()))?;

        let scenario = input
            .scenario
            .unwrap_or_else(|| self.generator.random_scenario());
        let events = self.generator.generate(self.clock.now(), scenario);
        let enqueued_events = events.len();

        debug!(
            shipment_id = %shipment_id,
            scenario = %scenario,
            event_count = enqueued_events,
            "sending tracking batch"
        );

        self.producer
            .publish(PublishTrackingInput {
                queue,
                shipment_id: shipment_id.clone(),
                events,
            })
            .await?;

        info!(
            shipment_id = %shipment_id,
            scenario = %scenario,
            enqueued_events,
            "enqueued tracking events"
        );

        Ok(IdentifyTrackingsOutput {
            shipment_id,
            scenario,
            enqueued_events,
        })
    }
}
