use crate::models::{ShipmentEventDocument, ShipmentRecordDocument};
use tracking_domain::{ShipmentEvent, ShipmentRecord};

impl From<&ShipmentRecord> for ShipmentRecordDocument {
    fn from(record: &ShipmentRecord) -> Self {
        ShipmentRecordDocument {
            shipment_id: record.shipment_id.clone(),
            status: record.status.clone(),
            created_at: record.created_at,
            last_updated_at: record.last_updated_at,
            destination_country: record.destination_country.clone(),
            order_id: record.order_id.clone(),
            events: record.events.iter().map(ShipmentEventDocument::from).collect(),
        }
    }
}

impl From<ShipmentRecordDocument> for ShipmentRecord {
    fn from(document: ShipmentRecordDocument) -> Self {
        ShipmentRecord {
            shipment_id: document.shipment_id,
            status: document.status,
            created_at: document.created_at,
            last_updated_at: document.last_updated_at,
            destination_country: document.destination_country,
            order_id: document.order_id,
            events: document.events.into_iter().map(ShipmentEvent::from).collect(),
        }
    }
}

impl From<&ShipmentEvent> for ShipmentEventDocument {
    fn from(event: &ShipmentEvent) -> Self {
        ShipmentEventDocument {
            event_type: event.event_type,
            event_code: event.event_code.clone(),
            event_at: event.event_at,
        }
    }
}

impl From<ShipmentEventDocument> for ShipmentEvent {
    fn from(document: ShipmentEventDocument) -> Self {
        ShipmentEvent::new(document.event_type, document.event_code, document.event_at)
    }
}
