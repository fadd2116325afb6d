// src/rabbitmq/confirm.rs

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use lapin::publisher_confirm::{Confirmation, PublisherConfirm};

use super::errors::{ProducerError, Result};
use crate::message::OutboundMessage;

/// The broker's verdict for one published message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Ack { delivery_tag: u64 },
    Nack { delivery_tag: u64 },
}

impl ConfirmOutcome {
    pub fn delivery_tag(&self) -> u64 {
        match *self {
            ConfirmOutcome::Ack { delivery_tag } | ConfirmOutcome::Nack { delivery_tag } => {
                delivery_tag
            }
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, ConfirmOutcome::Ack { .. })
    }
}

/// A pending acknowledgment for exactly one published message.
///
/// Returned immediately at publish time; `resolved` suspends until the
/// broker has acked or nacked that specific message and can only be called
/// once. There is no timeout on the wait: if the broker never answers, the
/// caller blocks indefinitely.
pub struct ConfirmationHandle {
    delivery_tag: u64,
    resolution: BoxFuture<'static, Result<ConfirmOutcome>>,
}

impl ConfirmationHandle {
    pub(crate) fn new(
        delivery_tag: u64,
        resolution: BoxFuture<'static, Result<ConfirmOutcome>>,
    ) -> Self {
        ConfirmationHandle {
            delivery_tag,
            resolution,
        }
    }

    /// Wraps the deferred confirmation lapin hands back from `basic_publish`.
    pub(crate) fn deferred(delivery_tag: u64, confirm: PublisherConfirm) -> Self {
        let resolution = async move {
            let confirmation = confirm
                .await
                .map_err(|e| ProducerError::Publish(format!("confirmation wait failed: {}", e)))?;

            match confirmation {
                Confirmation::Ack(_) => Ok(ConfirmOutcome::Ack { delivery_tag }),
                Confirmation::Nack(_) => Ok(ConfirmOutcome::Nack { delivery_tag }),
                Confirmation::NotRequested => Err(ProducerError::Capability(
                    "publisher confirms are not enabled on this channel".to_string(),
                )),
            }
        }
        .boxed();

        ConfirmationHandle::new(delivery_tag, resolution)
    }

    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    /// Suspends until the broker resolves this confirmation.
    pub async fn resolved(self) -> Result<ConfirmOutcome> {
        self.resolution.await
    }
}

/// Capability consumed by the publish loop: submit one message and get a
/// deferred confirmation back. The submission itself must not wait for the
/// broker's acknowledgment.
#[async_trait]
pub trait PublishTransport {
    async fn submit(&self, exchange: &str, message: &OutboundMessage)
        -> Result<ConfirmationHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_exposes_delivery_tag() {
        let ack = ConfirmOutcome::Ack { delivery_tag: 7 };
        let nack = ConfirmOutcome::Nack { delivery_tag: 8 };

        assert!(ack.is_ack());
        assert_eq!(ack.delivery_tag(), 7);
        assert!(!nack.is_ack());
        assert_eq!(nack.delivery_tag(), 8);
    }

    #[tokio::test]
    async fn handle_resolves_exactly_once_to_its_outcome() {
        let handle = ConfirmationHandle::new(
            3,
            async { Ok(ConfirmOutcome::Ack { delivery_tag: 3 }) }.boxed(),
        );

        assert_eq!(handle.delivery_tag(), 3);
        // resolved() consumes the handle, so a second observation cannot compile
        let outcome = handle.resolved().await.unwrap();
        assert_eq!(outcome, ConfirmOutcome::Ack { delivery_tag: 3 });
    }
}
