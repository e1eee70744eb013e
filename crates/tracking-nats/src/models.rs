use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracking_domain::ShipmentEventType;

/// Shipment record as stored in the object store, one JSON object per shipment id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecordDocument {
    pub shipment_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    #[serde(default)]
    pub destination_country: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub events: Vec<ShipmentEventDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentEventDocument {
    pub event_type: ShipmentEventType,
    pub event_code: String,
    pub event_at: DateTime<Utc>,
}
