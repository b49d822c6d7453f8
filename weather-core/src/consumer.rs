use futures::StreamExt;
use lapin::{
    Connection, ConnectionProperties,
    options::{BasicAckOptions, BasicConsumeOptions, BasicQosOptions},
    types::FieldTable,
};
use std::{future::Future, time::Duration};
use tracing::{error, info, warn};

use crate::{error::Result, model::Message, publisher::durable};

/// Worker side of the queue: logs every message and acknowledges it after a
/// simulated processing delay.
#[derive(Debug, Clone)]
pub struct Consumer {
    uri: String,
    queue: String,
    ack_delay: Duration,
}

/// What a delivery body turned out to be.
#[derive(Debug, PartialEq)]
pub enum Received {
    Weather(Message),
    Other(String),
}

impl Received {
    pub fn decode(body: &[u8]) -> Self {
        match serde_json::from_slice::<Message>(body) {
            Ok(message) => Received::Weather(message),
            Err(_) => Received::Other(String::from_utf8_lossy(body).into_owned()),
        }
    }
}

impl Consumer {
    pub fn new(uri: impl Into<String>, queue: impl Into<String>, ack_delay: Duration) -> Self {
        Self {
            uri: uri.into(),
            queue: queue.into(),
            ack_delay,
        }
    }

    /// Consumes until `shutdown` resolves or the broker closes the stream.
    /// Returns the number of acknowledged messages.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        let conn = Connection::connect(&self.uri, ConnectionProperties::default()).await?;
        let channel = conn.create_channel().await?;

        channel
            .queue_declare(&self.queue, durable(), FieldTable::default())
            .await?;
        channel.basic_qos(1, BasicQosOptions::default()).await?;

        let mut deliveries = channel
            .basic_consume(
                &self.queue,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        info!(queue = %self.queue, "worker initialized, waiting for messages");

        let mut acked = 0;
        let consuming = async {
            while let Some(delivery) = deliveries.next().await {
                let delivery = delivery?;

                match Received::decode(&delivery.data) {
                    Received::Weather(message) => info!(
                        city = message.location.city.as_deref().unwrap_or("unknown"),
                        country = message.location.country.as_deref().unwrap_or("unknown"),
                        "received weather message"
                    ),
                    Received::Other(text) => warn!("received non-weather message: {text}"),
                }

                tokio::time::sleep(self.ack_delay).await;

                match delivery.ack(BasicAckOptions::default()).await {
                    Ok(()) => {
                        acked += 1;
                        info!("confirmed message");
                    }
                    Err(e) => error!("ack error: {e}"),
                }
            }
            Ok::<_, lapin::Error>(())
        };

        let consumed = tokio::select! {
            res = consuming => res,
            _ = shutdown => {
                info!("shutdown signal received, terminating");
                Ok(())
            }
        };

        let closed = conn.close(200, "OK").await;
        consumed?;
        closed?;

        info!("shutdown completed");
        Ok(acked)
    }
}
