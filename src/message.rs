use lapin::types::FieldTable;
use lapin::BasicProperties;

/// Application id stamped on every published message; doubles as the
/// connection name presented to the broker.
pub const APP_ID: &str = "sequential-producer";

const DELIVERY_MODE_TRANSIENT: u8 = 1;
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// One outbound message, built fresh per publish cycle and immutable once
/// submitted.
#[derive(Clone, Debug)]
pub struct OutboundMessage {
    routing_key: String,
    content_type: String,
    content_encoding: String,
    persistent: bool,
    priority: u8,
    app_id: String,
    headers: FieldTable,
    body: Vec<u8>,
}

impl OutboundMessage {
    /// A plain-text message with the wire attributes the producer always
    /// uses: persistent delivery, priority 0, empty encoding and headers.
    pub fn text(routing_key: &str, body: impl Into<Vec<u8>>) -> Self {
        OutboundMessage {
            routing_key: routing_key.to_string(),
            content_type: "text/plain".to_string(),
            content_encoding: String::new(),
            persistent: true,
            priority: 0,
            app_id: APP_ID.to_string(),
            headers: FieldTable::default(),
            body: body.into(),
        }
    }

    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Maps the message attributes onto AMQP basic properties.
    pub fn properties(&self) -> BasicProperties {
        let delivery_mode = if self.persistent {
            DELIVERY_MODE_PERSISTENT
        } else {
            DELIVERY_MODE_TRANSIENT
        };

        BasicProperties::default()
            .with_content_type(self.content_type.as_str().into())
            .with_content_encoding(self.content_encoding.as_str().into())
            .with_delivery_mode(delivery_mode)
            .with_priority(self.priority)
            .with_app_id(self.app_id.as_str().into())
            .with_headers(self.headers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_carries_the_fixed_wire_attributes() {
        let message = OutboundMessage::text("test-key", "foobar");

        assert_eq!(message.routing_key(), "test-key");
        assert_eq!(message.body(), b"foobar");

        let properties = message.properties();
        assert_eq!(
            properties.content_type().as_ref().map(|s| s.as_str()),
            Some("text/plain")
        );
        assert_eq!(
            properties.content_encoding().as_ref().map(|s| s.as_str()),
            Some("")
        );
        assert_eq!(properties.delivery_mode(), &Some(DELIVERY_MODE_PERSISTENT));
        assert_eq!(properties.priority(), &Some(0));
        assert_eq!(
            properties.app_id().as_ref().map(|s| s.as_str()),
            Some("sequential-producer")
        );
        let headers = properties.headers().as_ref().expect("headers are set");
        assert!(headers.inner().is_empty());
    }

    #[test]
    fn body_bytes_come_from_the_configured_payload() {
        let message = OutboundMessage::text("k", vec![0x66, 0x6f, 0x6f]);
        assert_eq!(message.body(), b"foo");
    }
}
