pub mod batch_consumer;
pub mod clock;
pub mod error;
pub mod failure_report;
pub mod in_memory_shipment_record_store;
pub mod merge_engine;
pub mod repository;
pub mod scenario_event_generator;
pub mod shipment_service;
pub mod tracking_aggregation_service;
pub mod tracking_identification_service;
pub mod tracking_message;
pub mod types;

pub use batch_consumer::{group_by_shipment, ShipmentGroup};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use failure_report::FailureReport;
pub use in_memory_shipment_record_store::InMemoryShipmentRecordStore;
pub use merge_engine::{apply_tracking_events, merge_events};
pub use repository::{ShipmentRecordStore, TrackingMessageProducer};
pub use scenario_event_generator::{generate_scenario_events, LifecycleStep, ScenarioEventGenerator};
pub use shipment_service::ShipmentService;
pub use tracking_aggregation_service::TrackingAggregationService;
pub use tracking_identification_service::TrackingIdentificationService;
pub use tracking_message::{decode_tracking_message, encode_tracking_batch, TrackingMessage};
pub use types::*;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use repository::{MockShipmentRecordStore, MockTrackingMessageProducer};
