use crate::consumer::{BatchProcessor, ProcessingResult};
use anyhow::Result;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;
use tracking_domain::{QueuedMessage, TrackingAggregationService};

/// Create a batch processor that hands the fetched batch to the aggregation service
/// and maps its failed message ids back to nak indices
pub fn create_tracking_batch_processor(service: Arc<TrackingAggregationService>) -> BatchProcessor {
    Box::new(move |messages: &[QueuedMessage]| {
        let service = service.clone();
        let messages = messages.to_vec();

        Box::pin(async move {
            let result = service.consume_batch(&messages).await;

            let mut ack = Vec::new();
            let mut nak = Vec::new();
            for (index, message) in messages.iter().enumerate() {
                if result.is_failed(&message.message_id) {
                    nak.push((
                        index,
                        Some(format!("tracking message {} failed", message.message_id)),
                    ));
                } else {
                    ack.push(index);
                }
            }

            debug!(
                ack_count = ack.len(),
                nak_count = nak.len(),
                "Processed tracking batch"
            );

            Ok(ProcessingResult::new(ack, nak))
        }) as BoxFuture<'static, Result<ProcessingResult>>
    })
}
