use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Status assigned to a shipment before any tracking event has been merged
pub const CREATED_STATUS: &str = "CREATED";

/// Lifecycle stage an event belongs to.
///
/// `Processing` is accepted from the queue and stored like any other type,
/// although the scenario generator never emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentEventType {
    Processing,
    Shipped,
    Customs,
    LastMile,
    Delivered,
    Cancelled,
}

impl ShipmentEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Customs => "CUSTOMS",
            Self::LastMile => "LAST_MILE",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ShipmentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped step in a shipment's lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentEvent {
    pub event_type: ShipmentEventType,
    pub event_code: String,
    pub event_at: DateTime<Utc>,
}

impl ShipmentEvent {
    pub fn new(
        event_type: ShipmentEventType,
        event_code: impl Into<String>,
        event_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            event_code: event_code.into(),
            event_at,
        }
    }
}

/// Lifecycle scenario used to synthesize tracking events for a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scenario {
    CollectedOnly,
    ToDestination,
    AwaitingTax,
    LastMileInProgress,
    Delivered,
    Prohibited,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::CollectedOnly,
        Scenario::ToDestination,
        Scenario::AwaitingTax,
        Scenario::LastMileInProgress,
        Scenario::Delivered,
        Scenario::Prohibited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CollectedOnly => "COLLECTED_ONLY",
            Self::ToDestination => "TO_DESTINATION",
            Self::AwaitingTax => "AWAITING_TAX",
            Self::LastMileInProgress => "LAST_MILE_IN_PROGRESS",
            Self::Delivered => "DELIVERED",
            Self::Prohibited => "PROHIBITED",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scenario::ALL
            .into_iter()
            .find(|scenario| scenario.as_str() == s)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown scenario: {}", s)))
    }
}

/// Durable per-shipment record kept in the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRecord {
    pub shipment_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub destination_country: Option<String>,
    pub order_id: Option<String>,
    pub events: Vec<ShipmentEvent>,
}

/// A message as received from the queue, before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Opaque identifier the queue uses to redeliver this message
    pub message_id: String,
    pub body: bytes::Bytes,
}

impl QueuedMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<bytes::Bytes>) -> Self {
        Self {
            message_id: message_id.into(),
            body: body.into(),
        }
    }
}

/// Outcome of processing a batch: the identifiers that must be redelivered.
/// Identifiers not listed were durably processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub failed_message_ids: Vec<String>,
}

impl BatchResult {
    pub fn is_failed(&self, message_id: &str) -> bool {
        self.failed_message_ids.iter().any(|id| id == message_id)
    }

    pub fn failure_count(&self) -> usize {
        self.failed_message_ids.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed_message_ids.is_empty()
    }
}

/// Input for fetching a shipment record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetShipmentRecordInput {
    pub bucket: String,
    pub shipment_id: String,
}

/// Input for writing a full shipment record back to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutShipmentRecordInput {
    pub bucket: String,
    pub record: ShipmentRecord,
}

/// Input for publishing generated events for one shipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTrackingInput {
    pub queue: String,
    pub shipment_id: String,
    pub events: Vec<ShipmentEvent>,
}

/// Input for enqueueing new tracking events for a shipment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifyTrackingsInput {
    pub shipment_id: Option<String>,
    /// Pins the scenario; a random one is chosen when absent
    pub scenario: Option<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifyTrackingsOutput {
    pub shipment_id: String,
    pub scenario: Scenario,
    pub enqueued_events: usize,
}

/// Input for registering a new shipment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateShipmentInput {
    pub destination_country: String,
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetShipmentInput {
    pub shipment_id: String,
}
