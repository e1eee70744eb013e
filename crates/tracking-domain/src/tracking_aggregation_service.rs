use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::batch_consumer::{group_by_shipment, ShipmentGroup};
use crate::clock::Clock;
use crate::error::{DomainError, DomainResult};
use crate::failure_report::FailureReport;
use crate::merge_engine::apply_tracking_events;
use crate::repository::ShipmentRecordStore;
use crate::types::{BatchResult, GetShipmentRecordInput, PutShipmentRecordInput, QueuedMessage};

/// Domain service that folds batches of queued tracking messages into shipment records
///
/// Flow:
/// 1. Parse and validate each message, grouping valid ones by shipment
/// 2. For each shipment concurrently: fetch record, merge, derive status, write back
/// 3. Report the message ids that must be redelivered
///
/// The read-merge-write cycle is not transactional. Two batches touching the
/// same shipment at once can both read the same record and the later write
/// wins, dropping the other's events until they are redelivered.
pub struct TrackingAggregationService {
    store: Arc<dyn ShipmentRecordStore>,
    clock: Arc<dyn Clock>,
    records_bucket: Option<String>,
}

impl TrackingAggregationService {
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

    /// Process one batch and return the identifiers that failed.
    ///
    /// Without a records bucket nothing can be trusted, so every message in the
    /// batch is failed and the store is never contacted.
    #[instrument(skip(self, batch), fields(message_count = batch.len()))]
    pub async fn consume_batch(&self, batch: &[QueuedMessage]) -> BatchResult {
        let bucket = match self.records_bucket.as_deref().filter(|b| !b.is_empty()) {
            Some(bucket) => bucket,
            None => {
                error!("records bucket is not configured, failing entire batch");
                return FailureReport::fail_all(batch.iter().map(|m| m.message_id.as_str()));
            }
        };

        let mut report = FailureReport::default();
        let groups = group_by_shipment(batch, &mut report);

        debug!(
            shipment_count = groups.len(),
            "merging tracking events into shipment records"
        );

        let outcomes = join_all(groups.into_iter().map(|group| async move {
            let outcome = self.merge_group(bucket, &group).await;
            (group, outcome)
        }))
        .await;

        for (group, outcome) in outcomes {
            if let Err(e) = outcome {
                error!(
                    shipment_id = %group.shipment_id,
                    message_count = group.message_ids.len(),
                    error = %e,
                    "failed to persist shipment"
                );
                report.fail_group(&group.message_ids);
            }
        }

        let result = report.into_batch_result();
        if result.is_success() {
            info!("tracking batch processed");
        } else {
            warn!(
                failed_count = result.failure_count(),
                "tracking batch processed with failures"
            );
        }
        result
    }

    async fn merge_group(&self, bucket: &str, group: &ShipmentGroup) -> DomainResult<()> {
        let record = self
            .store
            .get_record(GetShipmentRecordInput {
                bucket: bucket.to_string(),
                shipment_id: group.shipment_id.clone(),
            })
            .await?
            .ok_or_else(|| DomainError::ShipmentNotFound(group.shipment_id.clone()))?;

        let updated = apply_tracking_events(record, group.events.clone(), self.clock.now());

        debug!(
            shipment_id = %updated.shipment_id,
            status = %updated.status,
            event_count = updated.events.len(),
            "persisting shipment"
        );

        self.store
            .put_record(PutShipmentRecordInput {
                bucket: bucket.to_string(),
                record: updated,
            })
            .await
    }
}
