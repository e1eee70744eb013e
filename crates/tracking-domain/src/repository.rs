use async_trait::async_trait;

use crate::error::DomainResult;
use crate::types::{GetShipmentRecordInput, PublishTrackingInput, PutShipmentRecordInput, ShipmentRecord};

/// Durable key-value store for shipment records, keyed by shipment id.
/// Infrastructure layer (e.g., the NATS object store) implements this trait
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ShipmentRecordStore: Send + Sync {
    /// Fetch the record stored under `input.shipment_id` in `input.bucket`.
    /// Returns None when no object exists under that key
    async fn get_record(&self, input: GetShipmentRecordInput) -> DomainResult<Option<ShipmentRecord>>;

    /// Replace the whole record under its shipment id in a single write
    async fn put_record(&self, input: PutShipmentRecordInput) -> DomainResult<()>;
}

/// Trait for publishing generated tracking events to the message broker
///
/// Implementations should:
/// - Serialize the events in the batch message form
/// - Publish exactly one message per call
/// - Return error if publish fails
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait TrackingMessageProducer: Send + Sync {
    async fn publish(&self, input: PublishTrackingInput) -> DomainResult<()>;
}
