use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::repository::ShipmentRecordStore;
use crate::types::{
    CreateShipmentInput, GetShipmentInput, GetShipmentRecordInput, PutShipmentRecordInput,
    ShipmentRecord, CREATED_STATUS,
};

/// Domain service for registering shipments and reading them back
pub struct ShipmentService {
    store: Arc<dyn ShipmentRecordStore>,
    clock: Arc<dyn Clock>,
    records_bucket: Option<String>,
}

impl ShipmentService {
    pub fn new(
        store: Arc<dyn ShipmentRecordStore>,
        clock: Arc<dyn Clock>,
        records_bucket: Option<String>,
    ) -> Self {
        Self {
            store,
            clock,
            records_bucket,
        }
    }

    fn bucket(&self) -> DomainResult<String> {
        self.records_bucket
            .clone()
            .filter(|bucket| !bucket.is_empty())
            .ok_or_else(|| {
                DomainError::MissingConfiguration("records bucket is not configured".to_string())
            })
    }

    /// Register a new shipment with no events and status CREATED.
    /// Generates a unique shipment_id using xid
    #[instrument(skip(self), fields(order_id = %input.order_id))]
    pub async fn create_shipment(&self, input: CreateShipmentInput) -> DomainResult<ShipmentRecord> {
        let bucket = self.bucket()?;

        if input.destination_country.is_empty() || input.order_id.is_empty() {
            return Err(DomainError::ValidationError(
                "destinationCountry and orderId are required".to_string(),
            ));
        }

        let now = self.clock.now();
        let record = ShipmentRecord {
            shipment_id: xid::new().to_string(),
            status: CREATED_STATUS.to_string(),
            created_at: now,
            last_updated_at: now,
            destination_country: Some(input.destination_country),
            order_id: Some(input.order_id),
            events: Vec::new(),
        };

        debug!(shipment_id = %record.shipment_id, "persisting new shipment");

        self.store
            .put_record(PutShipmentRecordInput {
                bucket,
                record: record.clone(),
            })
            .await?;

        info!(shipment_id = %record.shipment_id, "shipment created");
        Ok(record)
    }

    pub async fn get_shipment(&self, input: GetShipmentInput) -> DomainResult<ShipmentRecord> {
        let bucket = self.bucket()?;

        if input.shipment_id.is_empty() {
            return Err(DomainError::InvalidShipmentId(
                "Shipment ID cannot be empty".to_string(),
            ));
        }

        self.store
            .get_record(GetShipmentRecordInput {
                bucket,
                shipment_id: input.shipment_id.clone(),
            })
            .await?
            .ok_or(DomainError::ShipmentNotFound(input.shipment_id))
    }
}
