mod config;
mod demo_producer;

use config::ServiceConfig;
use demo_producer::{run_demo_producer, DemoProducerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracking_domain::{
    Clock, ScenarioEventGenerator, ShipmentRecordStore, ShipmentService, SystemClock,
    TrackingAggregationService, TrackingIdentificationService,
};
use tracking_nats::{
    create_tracking_batch_processor, NatsClient, NatsConsumer, NatsTrackingMessageProducer,
    ObjectStoreShipmentRecordStore,
};
use tracking_runner::Runner;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    info!(
        nats_url = %config.nats_url,
        trackings_stream = ?config.trackings_stream,
        shipments_bucket = ?config.shipments_bucket,
        "Starting tracking-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    let startup_timeout = Duration::from_secs(config.startup_timeout_secs);
    let nats_client = match tokio::time::timeout(startup_timeout, initialize_nats(&config)).await
    {
        Ok(Ok(client)) => Arc::new(client),
        Ok(Err(e)) => {
            error!(error = %format!("{:#}", e), "Failed to initialize NATS");
            std::process::exit(1);
        }
        Err(_) => {
            error!(
                timeout_secs = config.startup_timeout_secs,
                "Timed out initializing NATS"
            );
            std::process::exit(1);
        }
    };

    if config.shipments_bucket.is_none() {
        warn!("TRACKING_SHIPMENTS_BUCKET is not set; every tracking batch will be rejected");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn ShipmentRecordStore> = Arc::new(ObjectStoreShipmentRecordStore::new(
        nats_client.create_object_store_client(),
    ));

    let mut runner = Runner::new();

    match &config.trackings_stream {
        Some(stream) => {
            let aggregation = Arc::new(TrackingAggregationService::new(
                store.clone(),
                clock.clone(),
                config.shipments_bucket.clone(),
            ));

            let consumer = match NatsConsumer::new(
                nats_client.create_consumer_client(),
                stream,
                &config.nats_consumer_name,
                config.nats_batch_size,
                config.nats_batch_wait_secs,
                config.nats_redelivery_delay_secs,
                create_tracking_batch_processor(aggregation),
            )
            .await
            {
                Ok(consumer) => consumer,
                Err(e) => {
                    error!(error = %format!("{:#}", e), "Failed to create tracking consumer");
                    std::process::exit(1);
                }
            };

            runner = runner.with_named_process("tracking_aggregator", move |ctx| async move {
                consumer.run(ctx).await
            });
        }
        None => {
            warn!("TRACKING_TRACKINGS_STREAM is not set; tracking aggregator disabled");
        }
    }

    if config.demo_producer_enabled {
        let generator = match config.scenario_seed {
            Some(seed) => ScenarioEventGenerator::seeded(seed),
            None => ScenarioEventGenerator::from_entropy(),
        };
        let identification = Arc::new(TrackingIdentificationService::new(
            Arc::new(NatsTrackingMessageProducer::new(
                nats_client.create_publisher_client(),
            )),
            Arc::new(generator),
            clock.clone(),
            config.trackings_stream.clone(),
        ));
        let shipments = Arc::new(ShipmentService::new(
            store.clone(),
            clock.clone(),
            config.shipments_bucket.clone(),
        ));
        let demo_config = DemoProducerConfig {
            interval: Duration::from_secs(config.demo_producer_interval_secs),
            destination_country: config.demo_destination_country.clone(),
        };

        runner = runner.with_named_process("demo_tracking_producer", move |ctx| {
            run_demo_producer(ctx, demo_config, shipments, identification)
        });
    }

    runner = runner
        .with_closer({
            let nats_for_close = Arc::clone(&nats_client);
            move || async move {
                info!("Running cleanup tasks...");
                if let Ok(client) = Arc::try_unwrap(nats_for_close) {
                    client.close().await;
                }
                info!("Cleanup complete");
                Ok(())
            }
        })
        .with_closer_timeout(Duration::from_secs(10));

    drop(nats_client);

    runner.run().await;
}

fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_span_list(true)
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn initialize_nats(config: &ServiceConfig) -> anyhow::Result<NatsClient> {
    info!("Initializing NATS...");
    let client = NatsClient::connect(
        &config.nats_url,
        Duration::from_secs(config.startup_timeout_secs),
    )
    .await?;

    if let Some(stream) = &config.trackings_stream {
        client.ensure_stream(stream).await?;
    }
    if let Some(bucket) = &config.shipments_bucket {
        client.ensure_object_store(bucket).await?;
    }

    Ok(client)
}
