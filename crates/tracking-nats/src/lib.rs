mod client;
mod consumer;
mod conversions;
mod models;
mod object_store_record_store;
mod tracking_batch_processor;
mod tracking_message_producer;
mod traits;

pub use client::{
    NatsClient, NatsJetStreamConsumer, NatsJetStreamPublisher, NatsObjectStoreClient,
    NatsPullConsumer,
};
pub use consumer::{BatchProcessor, NatsConsumer, ProcessingResult};
pub use models::{ShipmentEventDocument, ShipmentRecordDocument};
pub use object_store_record_store::ObjectStoreShipmentRecordStore;
pub use tracking_batch_processor::create_tracking_batch_processor;
pub use tracking_message_producer::NatsTrackingMessageProducer;
pub use traits::{JetStreamConsumer, JetStreamPublisher, ObjectStoreClient, PullConsumer};

#[cfg(any(test, feature = "testing"))]
pub use traits::{
    MockJetStreamConsumer, MockJetStreamPublisher, MockObjectStoreClient, MockPullConsumer,
};
