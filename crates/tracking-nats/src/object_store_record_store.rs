use crate::models::ShipmentRecordDocument;
use crate::traits::ObjectStoreClient;
use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};
use tracking_domain::{
    DomainError, DomainResult, GetShipmentRecordInput, PutShipmentRecordInput, ShipmentRecord,
    ShipmentRecordStore,
};

/// ShipmentRecordStore backed by a NATS object store, one JSON object per shipment id
pub struct ObjectStoreShipmentRecordStore {
    client: Arc<dyn ObjectStoreClient>,
}

impl ObjectStoreShipmentRecordStore {
    pub fn new(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ShipmentRecordStore for ObjectStoreShipmentRecordStore {
    #[instrument(skip(self, input), fields(bucket = %input.bucket, shipment_id = %input.shipment_id))]
    async fn get_record(
        &self,
        input: GetShipmentRecordInput,
    ) -> DomainResult<Option<ShipmentRecord>> {
        let Some(content) = self
            .client
            .download(&input.bucket, &input.shipment_id)
            .await
            .map_err(DomainError::RepositoryError)?
        else {
            debug!("shipment record not found");
            return Ok(None);
        };

        let document: ShipmentRecordDocument = serde_json::from_slice(&content)
            .context("failed to parse stored shipment record")
            .map_err(DomainError::RepositoryError)?;

        Ok(Some(document.into()))
    }

    #[instrument(skip(self, input), fields(bucket = %input.bucket, shipment_id = %input.record.shipment_id))]
    async fn put_record(&self, input: PutShipmentRecordInput) -> DomainResult<()> {
        let document = ShipmentRecordDocument::from(&input.record);
        let content = serde_json::to_vec(&document)
            .context("failed to serialize shipment record")
            .map_err(DomainError::RepositoryError)?;

        self.client
            .upload(
                &input.bucket,
                &input.record.shipment_id,
                bytes::Bytes::from(content),
            )
            .await
            .map_err(DomainError::RepositoryError)?;

        debug!(event_count = input.record.events.len(), "stored shipment record");
        Ok(())
    }
}
