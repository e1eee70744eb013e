use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Maximum messages handed to one aggregation invocation
    #[serde(default = "default_nats_batch_size")]
    pub nats_batch_size: usize,

    /// Max wait time for batches in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    /// Delay before a rejected tracking message is redelivered, in seconds
    #[serde(default = "default_nats_redelivery_delay_secs")]
    pub nats_redelivery_delay_secs: u64,

    /// Durable consumer name for the tracking aggregator
    #[serde(default = "default_nats_consumer_name")]
    pub nats_consumer_name: String,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    // Locators. Left unset, the dependent processes fail their work instead of guessing.
    /// Object store bucket holding one record per shipment
    #[serde(default)]
    pub shipments_bucket: Option<String>,

    /// JetStream stream tracking messages are published to and consumed from
    #[serde(default)]
    pub trackings_stream: Option<String>,

    // Demo producer
    #[serde(default)]
    pub demo_producer_enabled: bool,

    #[serde(default = "default_demo_producer_interval_secs")]
    pub demo_producer_interval_secs: u64,

    #[serde(default = "default_demo_destination_country")]
    pub demo_destination_country: String,

    /// Seed for scenario event generation; entropy when unset
    #[serde(default)]
    pub scenario_seed: Option<u64>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_batch_size() -> usize {
    10
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

fn default_nats_redelivery_delay_secs() -> u64 {
    60
}

fn default_nats_consumer_name() -> String {
    "tracking-aggregator".to_string()
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_demo_producer_interval_secs() -> u64 {
    10
}

fn default_demo_destination_country() -> String {
    "BR".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("TRACKING"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "TRACKING_LOG_LEVEL",
        "TRACKING_NATS_BATCH_SIZE",
        "TRACKING_NATS_REDELIVERY_DELAY_SECS",
        "TRACKING_SHIPMENTS_BUCKET",
        "TRACKING_TRACKINGS_STREAM",
        "TRACKING_DEMO_PRODUCER_ENABLED",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.nats_batch_size, 10);
        assert_eq!(config.nats_redelivery_delay_secs, 60);
        assert_eq!(config.nats_consumer_name, "tracking-aggregator");
        assert!(config.shipments_bucket.is_none());
        assert!(config.trackings_stream.is_none());
        assert!(!config.demo_producer_enabled);
        assert!(config.scenario_seed.is_none());
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("TRACKING_LOG_LEVEL", "debug");
        std::env::set_var("TRACKING_NATS_BATCH_SIZE", "25");
        std::env::set_var("TRACKING_NATS_REDELIVERY_DELAY_SECS", "15");
        std::env::set_var("TRACKING_SHIPMENTS_BUCKET", "shipments");
        std::env::set_var("TRACKING_TRACKINGS_STREAM", "trackings");
        std::env::set_var("TRACKING_DEMO_PRODUCER_ENABLED", "true");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.nats_batch_size, 25);
        assert_eq!(config.nats_redelivery_delay_secs, 15);
        assert_eq!(config.shipments_bucket.as_deref(), Some("shipments"));
        assert_eq!(config.trackings_stream.as_deref(), Some("trackings"));
        assert!(config.demo_producer_enabled);

        clear_env();
    }
}
