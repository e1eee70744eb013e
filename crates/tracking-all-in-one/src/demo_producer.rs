use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracking_domain::{
    CreateShipmentInput, IdentifyTrackingsInput, ShipmentService, TrackingIdentificationService,
};

pub struct DemoProducerConfig {
    pub interval: Duration,
    pub destination_country: String,
}

/// Registers a shipment and enqueues its synthesized tracking events on every tick
/// until cancelled. Failures are logged and the loop carries on.
pub async fn run_demo_producer(
    ctx: CancellationToken,
    config: DemoProducerConfig,
    shipments: Arc<ShipmentService>,
    identification: Arc<TrackingIdentificationService>,
) -> Result<()> {
    info!(
        interval_secs = config.interval.as_secs(),
        "Demo tracking producer started"
    );

    loop {
        tokio::select! {
            _ = ctx.cancelled() => {
                info!("Received shutdown signal, stopping demo producer");
                break;
            }
            _ = tokio::time::sleep(config.interval) => {
                produce_once(&config, &shipments, &identification).await;
            }
        }
    }

    info!("Demo tracking producer stopped gracefully");
    Ok(())
}

async fn produce_once(
    config: &DemoProducerConfig,
    shipments: &ShipmentService,
    identification: &TrackingIdentificationService,
) {
    let shipment = match shipments
        .create_shipment(CreateShipmentInput {
            destination_country: config.destination_country.clone(),
            order_id: format!("demo-{}", xid::new()),
        })
        .await
    {
        Ok(shipment) => shipment,
        Err(e) => {
            error!(error = %e, "Failed to register demo shipment");
            return;
        }
    };

    match identification
        .identify_new_trackings(IdentifyTrackingsInput {
            shipment_id: Some(shipment.shipment_id.clone()),
            scenario: None,
        })
        .await
    {
        Ok(output) => debug!(
            shipment_id = %output.shipment_id,
            scenario = %output.scenario,
            enqueued_events = output.enqueued_events,
            "Enqueued demo tracking events"
        ),
        Err(e) => error!(
            shipment_id = %shipment.shipment_id,
            error = %e,
            "Failed to enqueue demo tracking events"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracking_domain::{
        InMemoryShipmentRecordStore, MockTrackingMessageProducer, ScenarioEventGenerator,
        SystemClock,
    };

    #[tokio::test]
    async fn test_demo_producer_registers_and_enqueues_until_cancelled() {
        let store = Arc::new(InMemoryShipmentRecordStore::new());
        let clock = Arc::new(SystemClock);

        let mut producer = MockTrackingMessageProducer::new();
        producer.expect_publish().times(1..).returning(|_| Ok(()));

        let shipments = Arc::new(ShipmentService::new(
            store.clone(),
            clock.clone(),
            Some("shipments".to_string()),
        ));
        let identification = Arc::new(TrackingIdentificationService::new(
            Arc::new(producer),
            Arc::new(ScenarioEventGenerator::seeded(3)),
            clock,
            Some("trackings".to_string()),
        ));

        let ctx = CancellationToken::new();
        let cancel = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            cancel.cancel();
        });

        run_demo_producer(
            ctx,
            DemoProducerConfig {
                interval: Duration::from_millis(50),
                destination_country: "BR".to_string(),
            },
            shipments,
            identification,
        )
        .await
        .unwrap();

        assert!(store.count().await >= 1);
    }

    #[tokio::test]
    async fn test_demo_producer_survives_missing_bucket() {
        let producer = MockTrackingMessageProducer::new();
        let clock = Arc::new(SystemClock);

        let shipments = Arc::new(ShipmentService::new(
            Arc::new(InMemoryShipmentRecordStore::new()),
            clock.clone(),
            None,
        ));
        let identification = Arc::new(TrackingIdentificationService::new(
            Arc::new(producer),
            Arc::new(ScenarioEventGenerator::seeded(3)),
            clock,
            Some("trackings".to_string()),
        ));

        let ctx = CancellationToken::new();
        let cancel = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        });

        let result = run_demo_producer(
            ctx,
            DemoProducerConfig {
                interval: Duration::from_millis(20),
                destination_country: "BR".to_string(),
            },
            shipments,
            identification,
        )
        .await;

        assert!(result.is_ok());
    }
}
