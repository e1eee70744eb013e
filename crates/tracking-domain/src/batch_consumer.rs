use std::collections::HashMap;
use tracing::warn;

use crate::failure_report::FailureReport;
use crate::tracking_message::decode_tracking_message;
use crate::types::{QueuedMessage, ShipmentEvent};

/// Valid events for one shipment collected from a batch, along with every
/// message that contributed to them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentGroup {
    pub shipment_id: String,
    pub events: Vec<ShipmentEvent>,
    pub message_ids: Vec<String>,
}

/// Parse every message in the batch and group the valid ones by shipment id.
///
/// Messages that fail validation are recorded in `report` and left out of the
/// groups. Groups are returned in the order their shipment was first seen and
/// events keep arrival order within each group.
pub fn group_by_shipment(batch: &[QueuedMessage], report: &mut FailureReport) -> Vec<ShipmentGroup> {
    let mut groups: Vec<ShipmentGroup> = Vec::new();
    let mut index_by_shipment: HashMap<String, usize> = HashMap::new();

    for message in batch {
        let (shipment_id, events) = match decode_tracking_message(&message.body) {
            Ok(decoded) => decoded.into_parts(),
            Err(e) => {
                warn!(
                    message_id = %message.message_id,
                    error = %e,
                    "failed to parse tracking message"
                );
                report.fail_message(&message.message_id);
                continue;
            }
        };

        let index = *index_by_shipment
            .entry(shipment_id.clone())
            .or_insert_with(|| {
                groups.push(ShipmentGroup {
                    shipment_id,
                    events: Vec::new(),
                    message_ids: Vec::new(),
                });
                groups.len() - 1
            });

        let group = &mut groups[index];
        group.events.extend(events);
        group.message_ids.push(message.message_id.clone());
    }

    groups
}
