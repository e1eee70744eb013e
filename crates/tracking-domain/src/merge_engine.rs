use chrono::{DateTime, Utc};

use crate::types::{ShipmentEvent, ShipmentRecord};

/// Concatenate existing and incoming events and sort them by `event_at`.
///
/// The sort is stable: events sharing a timestamp keep existing-before-incoming
/// order, then arrival order. Nothing is deduplicated.
pub fn merge_events(existing: Vec<ShipmentEvent>, incoming: Vec<ShipmentEvent>) -> Vec<ShipmentEvent> {
    let mut merged = existing;
    merged.extend(incoming);
    merged.sort_by_key(|event| event.event_at);
    merged
}

/// Apply incoming events to a record, deriving its status from the latest event
pub fn apply_tracking_events(
    record: ShipmentRecord,
    incoming: Vec<ShipmentEvent>,
    now: DateTime<Utc>,
) -> ShipmentRecord {
    let events = merge_events(record.events, incoming);
    let status = events
        .last()
        .map(|event| event.event_type.as_str().to_string())
        .unwrap_or(record.status);

    ShipmentRecord {
        status,
        last_updated_at: now,
        events,
        ..record
    }
}
