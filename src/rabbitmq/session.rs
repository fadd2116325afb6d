// src/rabbitmq/session.rs

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{error, info};

use super::confirm::{ConfirmationHandle, PublishTransport};
use super::errors::{ProducerError, Result};
use crate::message::OutboundMessage;

/// One connection and one channel scoped to it, owned by the producer for
/// the lifetime of the run.
///
/// There is no reconnect policy: every failure here is fatal and surfaces
/// as a [`ProducerError`].
pub struct BrokerSession {
    connection: Connection,
    channel: Channel,
    publish_seq: AtomicU64,
}

impl BrokerSession {
    /// Establishes the connection (announcing `client_name` to the broker)
    /// and opens the single channel the producer publishes on.
    pub async fn open(uri: &str, client_name: &str) -> Result<Self> {
        info!("dialing {}", uri);
        let properties = ConnectionProperties::default().with_connection_name(client_name.into());
        let connection = Connection::connect(uri, properties)
            .await
            .map_err(|e| ProducerError::Connection(format!("failed to dial {}: {}", uri, e)))?;

        info!("got connection, opening channel");
        let channel = connection
            .create_channel()
            .await
            .map_err(|e| ProducerError::Connection(format!("failed to open a channel: {}", e)))?;

        Ok(BrokerSession {
            connection,
            channel,
            publish_seq: AtomicU64::new(0),
        })
    }

    /// Declares the exchange messages will be published to. Safe to repeat
    /// with identical parameters; a mismatch with an existing declaration is
    /// a broker-side error and fatal here.
    pub async fn declare_exchange(
        &self,
        name: &str,
        kind: ExchangeKind,
        durable: bool,
    ) -> Result<()> {
        info!("declaring exchange {:?}", name);
        self.channel
            .exchange_declare(
                name,
                kind,
                ExchangeDeclareOptions {
                    durable,
                    ..ExchangeDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                ProducerError::Declaration(format!("failed to declare exchange {}: {}", name, e))
            })
    }

    /// Switches the channel into confirm mode. Must succeed before any
    /// publish whose confirmation will be awaited.
    pub async fn enable_confirms(&self) -> Result<()> {
        info!("enabling publisher confirms");
        self.channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| {
                ProducerError::Capability(format!(
                    "channel could not be put into confirm mode: {}",
                    e
                ))
            })
    }

    /// Releases the channel, then the connection. Best-effort: close
    /// failures are logged, not propagated.
    pub async fn close(self) {
        if let Err(e) = self.channel.close(0, "producer finished").await {
            error!("failed to close channel: {}", e);
        }
        if let Err(e) = self.connection.close(0, "producer finished").await {
            error!("failed to close connection: {}", e);
        }
    }
}

#[async_trait]
impl PublishTransport for BrokerSession {
    async fn submit(
        &self,
        exchange: &str,
        message: &OutboundMessage,
    ) -> Result<ConfirmationHandle> {
        let confirm = self
            .channel
            .basic_publish(
                exchange,
                message.routing_key(),
                BasicPublishOptions::default(),
                message.body(),
                message.properties(),
            )
            .await
            .map_err(|e| {
                ProducerError::Publish(format!("failed to publish to {}: {}", exchange, e))
            })?;

        // Confirm delivery tags count up from 1 per channel; with a single
        // in-flight message our own sequence mirrors the broker's numbering.
        let delivery_tag = self.publish_seq.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ConfirmationHandle::deferred(delivery_tag, confirm))
    }
}
