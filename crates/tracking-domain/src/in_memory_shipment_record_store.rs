use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::DomainResult;
use crate::repository::ShipmentRecordStore;
use crate::types::{GetShipmentRecordInput, PutShipmentRecordInput, ShipmentRecord};

/// In-memory implementation of ShipmentRecordStore keyed by (bucket, shipment id)
pub struct InMemoryShipmentRecordStore {
    records: Arc<RwLock<HashMap<(String, String), ShipmentRecord>>>,
}

impl InMemoryShipmentRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryShipmentRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShipmentRecordStore for InMemoryShipmentRecordStore {
    async fn get_record(&self, input: GetShipmentRecordInput) -> DomainResult<Option<ShipmentRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&(input.bucket, input.shipment_id)).cloned())
    }

    async fn put_record(&self, input: PutShipmentRecordInput) -> DomainResult<()> {
        let mut records = self.records.write().await;
        records.insert((input.bucket, input.record.shipment_id.clone()), input.record);
        Ok(())
    }
}
