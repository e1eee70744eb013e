use crate::traits::{JetStreamConsumer, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self, Message};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracking_domain::QueuedMessage;

/// Result of processing a batch of messages
/// Provides fine-grained control over which messages to acknowledge vs reject
#[derive(Debug, PartialEq, Eq)]
pub struct ProcessingResult {
    /// Messages that were successfully processed and should be acknowledged (Ack)
    pub ack: Vec<usize>,
    /// Messages that failed processing and should be redelivered (Nak) with optional error details
    pub nak: Vec<(usize, Option<String>)>,
}

impl ProcessingResult {
    pub fn ack_all(count: usize) -> Self {
        Self {
            ack: (0..count).collect(),
            nak: Vec::new(),
        }
    }

    pub fn nak_all(count: usize, error: Option<String>) -> Self {
        Self {
            ack: Vec::new(),
            nak: (0..count).map(|i| (i, error.clone())).collect(),
        }
    }

    pub fn new(ack: Vec<usize>, nak: Vec<(usize, Option<String>)>) -> Self {
        Self { ack, nak }
    }
}

/// Type alias for the batch processor function
/// Takes the fetched batch as queued messages (index-aligned with the raw batch)
/// and returns which indices to ack and which to nak
pub type BatchProcessor =
    Box<dyn Fn(&[QueuedMessage]) -> BoxFuture<'static, Result<ProcessingResult>> + Send + Sync>;

/// NATS JetStream pull consumer that hands fetched batches to a processor
/// and settles every message with an ack or a nak
pub struct NatsConsumer {
    consumer: Box<dyn PullConsumer>,
    stream_name: String,
    consumer_name: String,
    batch_size: usize,
    max_wait: Duration,
    redelivery_delay: Duration,
    processor: BatchProcessor,
}

impl NatsConsumer {
    pub async fn new(
        jetstream: Arc<dyn JetStreamConsumer>,
        stream_name: &str,
        consumer_name: &str,
        batch_size: usize,
        max_wait_secs: u64,
        redelivery_delay_secs: u64,
        processor: BatchProcessor,
    ) -> Result<Self> {
        let subject_filter = format!("{}.>", stream_name);

        debug!(
            stream = %stream_name,
            consumer = %consumer_name,
            filter_subject = %subject_filter,
            "Creating JetStream consumer"
        );

        let config = jetstream::consumer::pull::Config {
            name: Some(consumer_name.to_string()),
            durable_name: Some(consumer_name.to_string()),
            filter_subject: subject_filter,
            ack_policy: jetstream::consumer::AckPolicy::Explicit,
            ..Default::default()
        };

        let consumer = jetstream
            .create_consumer(config, stream_name)
            .await
            .context("Failed to create consumer")?;

        info!(
            stream = %stream_name,
            consumer = %consumer_name,
            "Consumer created successfully"
        );

        Ok(Self {
            consumer,
            stream_name: stream_name.to_string(),
            consumer_name: consumer_name.to_string(),
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            redelivery_delay: Duration::from_secs(redelivery_delay_secs),
            processor,
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!(
            stream = %self.stream_name,
            consumer = %self.consumer_name,
            "Starting consumer loop"
        );

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(consumer = %self.consumer_name, "Received shutdown signal, stopping consumer");
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(consumer = %self.consumer_name, error = %e, "Error processing batch");
                        // Continue processing despite errors
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!(consumer = %self.consumer_name, "Consumer stopped gracefully");
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        debug!(
            batch_size = self.batch_size,
            max_wait_secs = self.max_wait.as_secs(),
            "Fetching message batch"
        );

        let raw_messages = self
            .consumer
            .fetch_messages(self.batch_size, self.max_wait)
            .await?;

        if raw_messages.is_empty() {
            debug!("No messages in batch");
            return Ok(());
        }

        debug!(message_count = raw_messages.len(), "Received message batch");

        let queued: Vec<QueuedMessage> = raw_messages
            .iter()
            .enumerate()
            .map(|(index, msg)| to_queued_message(index, msg))
            .collect();

        let processing_result = match (self.processor)(&queued).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Processor returned error, rejecting all messages");
                ProcessingResult::nak_all(raw_messages.len(), Some(e.to_string()))
            }
        };

        settle(&raw_messages, processing_result, self.rejection()).await;
        Ok(())
    }

    /// Rejected messages become available again once the redelivery delay has passed
    fn rejection(&self) -> jetstream::AckKind {
        jetstream::AckKind::Nak(Some(self.redelivery_delay))
    }
}

/// The JetStream stream sequence identifies a message within the stream;
/// the batch position is only used if the message carries no JetStream metadata
fn to_queued_message(index: usize, msg: &Message) -> QueuedMessage {
    let message_id = match msg.info() {
        Ok(info) => info.stream_sequence.to_string(),
        Err(e) => {
            warn!(message_index = index, error = %e, "Message has no JetStream metadata");
            format!("batch-{}", index)
        }
    };
    QueuedMessage::new(message_id, msg.payload.clone())
}

async fn settle(
    raw_messages: &[Message],
    result: ProcessingResult,
    rejection: jetstream::AckKind,
) {
    let ack_count = result.ack.len();
    for idx in result.ack {
        match raw_messages.get(idx) {
            Some(msg) => {
                if let Err(e) = msg.ack().await {
                    error!(error = %e, message_index = idx, "Failed to acknowledge message");
                }
            }
            None => warn!(
                message_index = idx,
                batch_size = raw_messages.len(),
                "Invalid ack index in ProcessingResult"
            ),
        }
    }

    if ack_count > 0 {
        debug!(ack_count, "Acknowledged messages");
    }

    let nak_count = result.nak.len();
    for (idx, error_msg) in result.nak {
        let Some(msg) = raw_messages.get(idx) else {
            warn!(
                message_index = idx,
                batch_size = raw_messages.len(),
                "Invalid nak index in ProcessingResult"
            );
            continue;
        };

        match error_msg {
            Some(err) => warn!(
                message_index = idx,
                subject = %msg.subject,
                error = %err,
                "Rejecting message due to processing error"
            ),
            None => warn!(message_index = idx, subject = %msg.subject, "Rejecting message"),
        }

        if let Err(e) = msg.ack_with(rejection).await {
            error!(error = %e, message_index = idx, "Failed to reject message");
        }
    }

    if nak_count > 0 {
        debug!(nak_count, "Rejected messages for redelivery");
    }
}
