use crate::traits::JetStreamPublisher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use tracking_domain::{
    encode_tracking_batch, DomainError, DomainResult, PublishTrackingInput,
    TrackingMessageProducer,
};

/// Publishes batch-form tracking messages on `{queue}.{shipment_id}`
pub struct NatsTrackingMessageProducer {
    jetstream: Arc<dyn JetStreamPublisher>,
}

impl NatsTrackingMessageProducer {
    pub fn new(jetstream: Arc<dyn JetStreamPublisher>) -> Self {
        Self { jetstream }
    }
}

#[async_trait]
impl TrackingMessageProducer for NatsTrackingMessageProducer {
    #[instrument(skip(self, input), fields(queue = %input.queue, shipment_id = %input.shipment_id))]
    async fn publish(&self, input: PublishTrackingInput) -> DomainResult<()> {
        let payload = encode_tracking_batch(&input.shipment_id, &input.events)?;
        let subject = format!("{}.{}", input.queue, input.shipment_id);

        self.jetstream
            .publish(subject, bytes::Bytes::from(payload))
            .await
            .map_err(DomainError::RepositoryError)?;

        debug!(event_count = input.events.len(), "Published tracking message");
        Ok(())
    }
}
