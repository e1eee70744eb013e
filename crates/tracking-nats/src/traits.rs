use anyhow::Result;
use async_nats::jetstream;
use async_trait::async_trait;

/// Trait for JetStream consumer operations
/// Abstracts the operations needed to create and use a NATS JetStream consumer
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait JetStreamConsumer: Send + Sync {
    /// Create a durable pull consumer on a stream
    async fn create_consumer(
        &self,
        config: jetstream::consumer::pull::Config,
        stream_name: &str,
    ) -> Result<Box<dyn PullConsumer>>;
}

/// Trait for pull consumer operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PullConsumer: Send + Sync {
    /// Returns a batch of messages up to max_messages, waiting up to expires duration
    async fn fetch_messages(
        &self,
        max_messages: usize,
        expires: std::time::Duration,
    ) -> Result<Vec<jetstream::Message>>;
}

/// Trait for JetStream publisher operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait JetStreamPublisher: Send + Sync {
    /// Publish a message to a subject and await the JetStream acknowledgment
    async fn publish(&self, subject: String, payload: bytes::Bytes) -> Result<()>;
}

/// Trait for object store operations, addressed by bucket and key
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn upload(&self, bucket: &str, key: &str, content: bytes::Bytes) -> Result<()>;

    /// Returns None when the key does not exist in the bucket
    async fn download(&self, bucket: &str, key: &str) -> Result<Option<bytes::Bytes>>;
}
