use crate::traits::{JetStreamConsumer, JetStreamPublisher, ObjectStoreClient, PullConsumer};
use anyhow::{Context, Result};
use async_nats::jetstream::{self, object_store, stream::Config as StreamConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

pub struct NatsClient {
    jetstream: jetstream::Context,
}

impl NatsClient {
    pub async fn connect(url: &str, timeout: std::time::Duration) -> Result<Self> {
        info!(url = %url, timeout_ms = timeout.as_millis(), "Connecting to NATS");

        let client = async_nats::ConnectOptions::new()
            .connection_timeout(timeout)
            .connect(url)
            .await
            .context("Failed to connect to NATS")?;

        let jetstream = jetstream::new(client);

        info!("Successfully connected to NATS");
        Ok(Self { jetstream })
    }

    /// Make sure the tracking stream exists, capturing every per-shipment subject under it
    pub async fn ensure_stream(&self, stream_name: &str) -> Result<()> {
        info!(stream = %stream_name, "Ensuring stream exists");

        let stream_config = StreamConfig {
            name: stream_name.to_string(),
            subjects: vec![format!("{}.>", stream_name)],
            description: Some("Stream for shipment tracking events".to_string()),
            ..Default::default()
        };

        match self.jetstream.get_stream(stream_name).await {
            Ok(_) => {
                info!(stream = %stream_name, "Stream already exists");
            }
            Err(_) => {
                self.jetstream
                    .create_stream(stream_config)
                    .await
                    .context("Failed to create stream")?;
                info!(stream = %stream_name, "Created stream");
            }
        }

        Ok(())
    }

    pub async fn ensure_object_store(&self, bucket: &str) -> Result<()> {
        open_or_create_bucket(&self.jetstream, bucket).await?;
        Ok(())
    }

    /// Create a JetStreamConsumer trait object from this client
    pub fn create_consumer_client(&self) -> Arc<dyn JetStreamConsumer> {
        Arc::new(NatsJetStreamConsumer::new(self.jetstream.clone()))
    }

    /// Create a JetStreamPublisher trait object from this client
    pub fn create_publisher_client(&self) -> Arc<dyn JetStreamPublisher> {
        Arc::new(NatsJetStreamPublisher::new(self.jetstream.clone()))
    }

    /// Create an ObjectStoreClient trait object from this client
    pub fn create_object_store_client(&self) -> Arc<dyn ObjectStoreClient> {
        Arc::new(NatsObjectStoreClient::new(self.jetstream.clone()))
    }

    pub async fn close(self) {
        info!("Closing NATS connection");
        // Connection closes automatically when dropped
    }
}

async fn open_or_create_bucket(
    jetstream: &jetstream::Context,
    bucket: &str,
) -> Result<object_store::ObjectStore> {
    match jetstream.get_object_store(bucket).await {
        Ok(store) => {
            debug!(bucket = %bucket, "object store bucket already exists");
            Ok(store)
        }
        Err(_) => {
            debug!(bucket = %bucket, "creating object store bucket");
            jetstream
                .create_object_store(object_store::Config {
                    bucket: bucket.to_string(),
                    ..Default::default()
                })
                .await
                .context("failed to create object store bucket")
        }
    }
}

/// Concrete implementation of JetStreamConsumer using async-nats
pub struct NatsJetStreamConsumer {
    context: jetstream::Context,
}

impl NatsJetStreamConsumer {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl JetStreamConsumer for NatsJetStreamConsumer {
    async fn create_consumer(
        &self,
        config: jetstream::consumer::pull::Config,
        stream_name: &str,
    ) -> Result<Box<dyn PullConsumer>> {
        let consumer = self
            .context
            .create_consumer_on_stream(config, stream_name)
            .await
            .context("Failed to create consumer")?;

        Ok(Box::new(NatsPullConsumer { consumer }))
    }
}

/// Concrete implementation of PullConsumer using async-nats
pub struct NatsPullConsumer {
    consumer: jetstream::consumer::PullConsumer,
}

#[async_trait]
impl PullConsumer for NatsPullConsumer {
    async fn fetch_messages(
        &self,
        max_messages: usize,
        expires: std::time::Duration,
    ) -> Result<Vec<jetstream::Message>> {
        use futures::StreamExt;

        let mut messages = self
            .consumer
            .fetch()
            .max_messages(max_messages)
            .expires(expires)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut result = Vec::new();
        while let Some(msg) = messages.next().await {
            match msg {
                Ok(message) => result.push(message),
                Err(e) => {
                    error!(error = %e, "Error receiving message");
                }
            }
        }
        Ok(result)
    }
}

/// Concrete implementation of JetStreamPublisher using async-nats
pub struct NatsJetStreamPublisher {
    context: jetstream::Context,
}

impl NatsJetStreamPublisher {
    pub fn new(context: jetstream::Context) -> Self {
        Self { context }
    }
}

#[async_trait]
impl JetStreamPublisher for NatsJetStreamPublisher {
    #[instrument(skip(self, payload), fields(subject = %subject, payload_size = payload.len()))]
    async fn publish(&self, subject: String, payload: bytes::Bytes) -> Result<()> {
        let ack = self
            .context
            .publish(subject, payload)
            .await
            .context("Failed to publish message to JetStream")?;

        ack.await
            .context("Failed to receive JetStream acknowledgment")?;
        Ok(())
    }
}

/// Object store client that opens bucket handles lazily and keeps them for the process lifetime
pub struct NatsObjectStoreClient {
    context: jetstream::Context,
    buckets: RwLock<HashMap<String, object_store::ObjectStore>>,
}

impl NatsObjectStoreClient {
    pub fn new(context: jetstream::Context) -> Self {
        Self {
            context,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    async fn bucket(&self, bucket: &str) -> Result<object_store::ObjectStore> {
        if let Some(store) = self.buckets.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let store = open_or_create_bucket(&self.context, bucket).await?;
        self.buckets
            .write()
            .await
            .insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectStoreClient for NatsObjectStoreClient {
    async fn upload(&self, bucket: &str, key: &str, content: bytes::Bytes) -> Result<()> {
        let store = self.bucket(bucket).await?;
        let mut reader = &content[..];
        store
            .put(key, &mut reader)
            .await
            .context("failed to upload object")?;
        Ok(())
    }

    async fn download(&self, bucket: &str, key: &str) -> Result<Option<bytes::Bytes>> {
        let store = self.bucket(bucket).await?;

        let mut object = match store.get(key).await {
            Ok(object) => object,
            Err(err) if err.kind() == object_store::GetErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("failed to get object"),
        };

        let mut buf = Vec::new();
        object
            .read_to_end(&mut buf)
            .await
            .context("failed to read object content")?;

        Ok(Some(bytes::Bytes::from(buf)))
    }
}
