use async_trait::async_trait;
use lapin::{
    BasicProperties, Connection, ConnectionProperties,
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
};
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

use crate::error::{Error, Result};

#[async_trait]
pub trait Publisher: Send + Sync + Debug {
    /// Publishes `body` on the durable queue `queue`.
    async fn publish(&self, queue: &str, body: &[u8]) -> Result<()>;
}

/// Serializes `payload` to JSON and publishes it.
pub async fn publish_json<T>(publisher: &dyn Publisher, queue: &str, payload: &T) -> Result<()>
where
    T: Serialize + Sync + ?Sized,
{
    let body = serde_json::to_vec(payload).map_err(Error::Encode)?;
    publisher.publish(queue, &body).await
}

/// Opens a fresh broker connection for every publish and closes it afterwards.
#[derive(Debug, Clone)]
pub struct AmqpPublisher {
    uri: String,
}

impl AmqpPublisher {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

pub(crate) fn durable() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

#[async_trait]
impl Publisher for AmqpPublisher {
    async fn publish(&self, queue: &str, body: &[u8]) -> Result<()> {
        let conn = Connection::connect(&self.uri, ConnectionProperties::default()).await?;

        let sent = async {
            let channel = conn.create_channel().await?;
            channel
                .queue_declare(queue, durable(), FieldTable::default())
                .await?;
            channel
                .basic_publish(
                    "",
                    queue,
                    BasicPublishOptions::default(),
                    body,
                    BasicProperties::default().with_content_type("application/json".into()),
                )
                .await?;
            Ok::<_, lapin::Error>(())
        }
        .await;

        let closed = conn.close(200, "OK").await;
        sent?;
        closed?;

        debug!(queue, bytes = body.len(), "published");
        Ok(())
    }
}
