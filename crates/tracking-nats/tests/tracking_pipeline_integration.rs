#![cfg(feature = "integration-tests")]

use std::sync::Arc;
use std::time::Duration;
use testcontainers::core::WaitFor;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracking_domain::{
    CreateShipmentInput, GetShipmentInput, GetShipmentRecordInput, IdentifyTrackingsInput,
    Scenario, ScenarioEventGenerator, ShipmentRecordStore, ShipmentService, SystemClock,
    TrackingAggregationService, TrackingIdentificationService,
};
use tracking_nats::{
    create_tracking_batch_processor, NatsClient, NatsConsumer, NatsTrackingMessageProducer,
    ObjectStoreShipmentRecordStore,
};

const STREAM_NAME: &str = "test_trackings";
const BUCKET_NAME: &str = "test_shipments";

struct TestEnvironment {
    _nats_container: ContainerAsync<GenericImage>,
    nats_client: NatsClient,
}

async fn setup_test_env() -> TestEnvironment {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .try_init();

    // Start NATS container with JetStream enabled
    let nats_container = GenericImage::new("nats", "latest")
        .with_wait_for(WaitFor::message_on_stderr("Server is ready"))
        .with_exposed_port(4222.into())
        .with_cmd(["-js"])
        .start()
        .await
        .unwrap();

    let nats_host = nats_container.get_host().await.unwrap();
    let nats_port = nats_container.get_host_port_ipv4(4222).await.unwrap();
    let nats_url = format!("nats://{}:{}", nats_host, nats_port);

    info!("NATS started at {}", nats_url);

    let nats_client = NatsClient::connect(&nats_url, Duration::from_secs(10))
        .await
        .unwrap();
    nats_client.ensure_stream(STREAM_NAME).await.unwrap();
    nats_client.ensure_object_store(BUCKET_NAME).await.unwrap();

    TestEnvironment {
        _nats_container: nats_container,
        nats_client,
    }
}

#[tokio::test]
async fn test_object_store_record_store_roundtrip() {
    let env = setup_test_env().await;
    let store = Arc::new(ObjectStoreShipmentRecordStore::new(
        env.nats_client.create_object_store_client(),
    ));

    let missing = store
        .get_record(GetShipmentRecordInput {
            bucket: BUCKET_NAME.to_string(),
            shipment_id: "does-not-exist".to_string(),
        })
        .await
        .unwrap();
    assert!(missing.is_none());

    let service = ShipmentService::new(
        store.clone(),
        Arc::new(SystemClock),
        Some(BUCKET_NAME.to_string()),
    );
    let created = service
        .create_shipment(CreateShipmentInput {
            destination_country: "BR".to_string(),
            order_id: "order-1".to_string(),
        })
        .await
        .unwrap();

    let fetched = service
        .get_shipment(GetShipmentInput {
            shipment_id: created.shipment_id.clone(),
        })
        .await
        .unwrap();

    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_identified_trackings_are_merged_into_shipment_record() {
    let env = setup_test_env().await;
    let store: Arc<dyn ShipmentRecordStore> = Arc::new(ObjectStoreShipmentRecordStore::new(
        env.nats_client.create_object_store_client(),
    ));
    let clock = Arc::new(SystemClock);

    let shipments = ShipmentService::new(store.clone(), clock.clone(), Some(BUCKET_NAME.to_string()));
    let shipment = shipments
        .create_shipment(CreateShipmentInput {
            destination_country: "BR".to_string(),
            order_id: "order-2".to_string(),
        })
        .await
        .unwrap();

    let identification = TrackingIdentificationService::new(
        Arc::new(NatsTrackingMessageProducer::new(
            env.nats_client.create_publisher_client(),
        )),
        Arc::new(ScenarioEventGenerator::seeded(7)),
        clock.clone(),
        Some(STREAM_NAME.to_string()),
    );
    let output = identification
        .identify_new_trackings(IdentifyTrackingsInput {
            shipment_id: Some(shipment.shipment_id.clone()),
            scenario: Some(Scenario::Delivered),
        })
        .await
        .unwrap();
    assert_eq!(output.enqueued_events, 10);

    let aggregation = Arc::new(TrackingAggregationService::new(
        store.clone(),
        clock,
        Some(BUCKET_NAME.to_string()),
    ));
    let consumer = NatsConsumer::new(
        env.nats_client.create_consumer_client(),
        STREAM_NAME,
        "test-tracking-aggregator",
        10,
        1,
        1,
        create_tracking_batch_processor(aggregation),
    )
    .await
    .unwrap();

    let ctx = CancellationToken::new();
    let consumer_ctx = ctx.clone();
    let handle = tokio::spawn(async move { consumer.run(consumer_ctx).await });

    let record = timeout(Duration::from_secs(30), async {
        loop {
            let record = shipments
                .get_shipment(GetShipmentInput {
                    shipment_id: shipment.shipment_id.clone(),
                })
                .await
                .unwrap();
            if !record.events.is_empty() {
                return record;
            }
            sleep(Duration::from_millis(200)).await;
        }
    })
    .await
    .expect("tracking events were not merged in time");

    ctx.cancel();
    handle.await.unwrap().unwrap();

    assert_eq!(record.events.len(), 10);
    assert_eq!(record.status, "DELIVERED");
    assert!(record
        .events
        .windows(2)
        .all(|pair| pair[0].event_at < pair[1].event_at));
}
