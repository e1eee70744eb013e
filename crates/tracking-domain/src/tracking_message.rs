use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::types::{ShipmentEvent, ShipmentEventType};

/// A validated tracking message.
///
/// The queue carries two body shapes: the batch form with an `events` array
/// and the singular form with one `event` object. The discriminant is which
/// of the two keys is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingMessage {
    Batch {
        shipment_id: String,
        events: Vec<ShipmentEvent>,
    },
    Single {
        shipment_id: String,
        event: ShipmentEvent,
    },
}

impl TrackingMessage {
    pub fn shipment_id(&self) -> &str {
        match self {
            TrackingMessage::Batch { shipment_id, .. } => shipment_id,
            TrackingMessage::Single { shipment_id, .. } => shipment_id,
        }
    }

    /// Split into the shipment id and the carried events, singular form as a one-element list
    pub fn into_parts(self) -> (String, Vec<ShipmentEvent>) {
        match self {
            TrackingMessage::Batch {
                shipment_id,
                events,
            } => (shipment_id, events),
            TrackingMessage::Single { shipment_id, event } => (shipment_id, vec![event]),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackingMessageBody {
    #[serde(default)]
    shipment_id: Option<String>,
    #[serde(default)]
    events: Option<Vec<ShipmentEventBody>>,
    #[serde(default)]
    event: Option<ShipmentEventBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShipmentEventBody {
    event_type: ShipmentEventType,
    #[serde(default)]
    event_code: String,
    #[serde(default)]
    event_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackingBatchBody<'a> {
    shipment_id: &'a str,
    events: &'a [ShipmentEvent],
}

impl TryFrom<ShipmentEventBody> for ShipmentEvent {
    type Error = DomainError;

    fn try_from(body: ShipmentEventBody) -> Result<Self, Self::Error> {
        let raw_event_at = body
            .event_at
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                DomainError::InvalidTrackingMessage("event.eventAt is required".to_string())
            })?;

        let event_at = parse_event_at(raw_event_at.trim()).ok_or_else(|| {
            DomainError::InvalidTrackingMessage(format!(
                "event.eventAt '{}' is not a valid timestamp",
                raw_event_at
            ))
        })?;

        Ok(ShipmentEvent {
            event_type: body.event_type,
            event_code: body.event_code,
            event_at,
        })
    }
}

/// ISO-8601 timestamp; local date-times and bare dates are taken as UTC
fn parse_event_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

/// Parse and validate a queue message body.
///
/// Rejected (each isolated to this message): malformed JSON, a missing or
/// empty `shipmentId`, a body with neither `events` nor `event`, an empty
/// `events` array, and any event without a parseable `eventAt`.
pub fn decode_tracking_message(body: &[u8]) -> DomainResult<TrackingMessage> {
    let parsed: TrackingMessageBody = serde_json::from_slice(body)
        .map_err(|e| DomainError::InvalidTrackingMessage(format!("malformed body: {}", e)))?;

    let shipment_id = parsed
        .shipment_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| DomainError::InvalidTrackingMessage("Missing shipmentId".to_string()))?;

    match (parsed.events, parsed.event) {
        (Some(events), _) => {
            if events.is_empty() {
                return Err(DomainError::InvalidTrackingMessage(
                    "No events provided".to_string(),
                ));
            }
            let events = events
                .into_iter()
                .map(ShipmentEvent::try_from)
                .collect::<DomainResult<Vec<_>>>()?;
            Ok(TrackingMessage::Batch {
                shipment_id,
                events,
            })
        }
        (None, Some(event)) => Ok(TrackingMessage::Single {
            shipment_id,
            event: event.try_into()?,
        }),
        (None, None) => Err(DomainError::InvalidTrackingMessage(
            "No events provided".to_string(),
        )),
    }
}

/// Serialize events for one shipment in the batch form
pub fn encode_tracking_batch(shipment_id: &str, events: &[ShipmentEvent]) -> DomainResult<Vec<u8>> {
    let body = TrackingBatchBody {
        shipment_id,
        events,
    };
    serde_json::to_vec(&body).map_err(|e| DomainError::RepositoryError(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decode_batch_form() {
        let body = br#"{
            "shipmentId": "s-1",
            "events": [
                {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00.000Z"},
                {"eventType": "SHIPPED", "eventCode": "IN_FLIGHT", "eventAt": "2025-10-01T20:00:00.000Z"}
            ]
        }"#;

        let message = decode_tracking_message(body).unwrap();

        assert_eq!(message.shipment_id(), "s-1");
        let (_, events) = message.into_parts();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0].event_at,
            Utc.with_ymd_and_hms(2025, 10, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_singular_form_wraps_one_event() {
        let body = br#"{
            "shipmentId": "s-2",
            "event": {"eventType": "CUSTOMS", "eventCode": "NATIONALIZED", "eventAt": "2025-10-02T08:00:00Z"}
        }"#;

        let message = decode_tracking_message(body).unwrap();
        assert!(matches!(message, TrackingMessage::Single { .. }));

        let (shipment_id, events) = message.into_parts();
        assert_eq!(shipment_id, "s-2");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, ShipmentEventType::Customs);
    }

    #[test]
    fn test_events_key_takes_precedence_over_event() {
        let body = br#"{
            "shipmentId": "s-3",
            "events": [{"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00Z"}],
            "event": {"eventType": "DELIVERED", "eventCode": "DELIVERED", "eventAt": "2025-10-09T13:00:00Z"}
        }"#;

        let message = decode_tracking_message(body).unwrap();
        assert!(matches!(message, TrackingMessage::Batch { .. }));
    }

    #[test]
    fn test_decode_rejects_missing_shipment_id() {
        let body = br#"{"event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00Z"}}"#;
        let result = decode_tracking_message(body);
        assert!(matches!(result, Err(DomainError::InvalidTrackingMessage(_))));

        let body = br#"{"shipmentId": "", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00Z"}}"#;
        let result = decode_tracking_message(body);
        assert!(matches!(result, Err(DomainError::InvalidTrackingMessage(_))));
    }

    #[test]
    fn test_decode_rejects_neither_shape() {
        let result = decode_tracking_message(br#"{"shipmentId": "s-4"}"#);
        assert!(matches!(result, Err(DomainError::InvalidTrackingMessage(_))));
    }

    #[test]
    fn test_decode_rejects_empty_events() {
        let result = decode_tracking_message(br#"{"shipmentId": "s-5", "events": []}"#);
        assert!(matches!(result, Err(DomainError::InvalidTrackingMessage(_))));
    }

    #[test]
    fn test_decode_rejects_missing_or_invalid_event_at() {
        let missing = br#"{"shipmentId": "s-6", "events": [
            {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00Z"},
            {"eventType": "SHIPPED", "eventCode": "IN_FLIGHT"}
        ]}"#;
        assert!(decode_tracking_message(missing).is_err());

        let empty = br#"{"shipmentId": "s-6", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": ""}}"#;
        assert!(decode_tracking_message(empty).is_err());

        let garbage = br#"{"shipmentId": "s-6", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "yesterday"}}"#;
        assert!(decode_tracking_message(garbage).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_json_and_unknown_type() {
        assert!(decode_tracking_message(b"not json").is_err());
        assert!(decode_tracking_message(b"[1, 2, 3]").is_err());

        let unknown = br#"{"shipmentId": "s-7", "event": {"eventType": "TELEPORTED", "eventCode": "X", "eventAt": "2025-10-01T13:00:00Z"}}"#;
        assert!(decode_tracking_message(unknown).is_err());
    }

    #[test]
    fn test_decode_accepts_local_and_date_only_timestamps_as_utc() {
        let local = br#"{"shipmentId": "s-10", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00"}}"#;
        let (_, events) = decode_tracking_message(local).unwrap().into_parts();
        assert_eq!(
            events[0].event_at,
            Utc.with_ymd_and_hms(2025, 10, 1, 13, 0, 0).unwrap()
        );

        let fractional = br#"{"shipmentId": "s-10", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T13:00:00.250"}}"#;
        let (_, events) = decode_tracking_message(fractional).unwrap().into_parts();
        assert_eq!(events[0].event_at.timestamp_subsec_millis(), 250);

        let date_only = br#"{"shipmentId": "s-10", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01"}}"#;
        let (_, events) = decode_tracking_message(date_only).unwrap().into_parts();
        assert_eq!(
            events[0].event_at,
            Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_normalizes_offset_to_utc() {
        let body = br#"{"shipmentId": "s-11", "event": {"eventType": "SHIPPED", "eventCode": "COLLECTED", "eventAt": "2025-10-01T10:00:00-03:00"}}"#;
        let (_, events) = decode_tracking_message(body).unwrap().into_parts();
        assert_eq!(
            events[0].event_at,
            Utc.with_ymd_and_hms(2025, 10, 1, 13, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_accepts_missing_event_code() {
        let body = br#"{"shipmentId": "s-12", "event": {"eventType": "SHIPPED", "eventAt": "2025-10-01T13:00:00Z"}}"#;
        let (_, events) = decode_tracking_message(body).unwrap().into_parts();
        assert_eq!(events[0].event_code, "");
        assert_eq!(events[0].event_type, ShipmentEventType::Shipped);
    }

    #[test]
    fn test_processing_event_type_is_accepted() {
        let body = br#"{"shipmentId": "s-8", "event": {"eventType": "PROCESSING", "eventCode": "LABEL_PRINTED", "eventAt": "2025-10-01T13:00:00Z"}}"#;
        let (_, events) = decode_tracking_message(body).unwrap().into_parts();
        assert_eq!(events[0].event_type, ShipmentEventType::Processing);
    }

    #[test]
    fn test_encoded_batch_decodes_to_same_events() {
        let events = vec![
            ShipmentEvent::new(
                ShipmentEventType::Shipped,
                "COLLECTED",
                Utc.with_ymd_and_hms(2025, 10, 1, 13, 0, 0).unwrap(),
            ),
            ShipmentEvent::new(
                ShipmentEventType::Cancelled,
                "PROHIBITED",
                Utc.with_ymd_and_hms(2025, 10, 4, 9, 0, 0).unwrap(),
            ),
        ];

        let body = encode_tracking_batch("s-9", &events).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["shipmentId"], "s-9");
        assert_eq!(json["events"][1]["eventType"], "CANCELLED");

        let (shipment_id, decoded) = decode_tracking_message(&body).unwrap().into_parts();
        assert_eq!(shipment_id, "s-9");
        assert_eq!(decoded, events);
    }
}
