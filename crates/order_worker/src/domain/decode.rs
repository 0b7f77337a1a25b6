use common::domain::Order;
use serde::Deserialize;
use thiserror::Error;

/// Outer pub/sub delivery wrapper around the serialized order payload.
#[derive(Debug, Deserialize)]
struct TransportEnvelope {
    #[serde(rename = "Message")]
    message: String,
}

/// Reason a message body could not be decoded into an [`Order`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed transport envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed order payload: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Tagged result of decoding one message body.
///
/// Poison messages are surfaced explicitly so the discard policy stays
/// visible at the call site instead of hiding behind an error path: the
/// caller deletes them unconditionally, emits no metrics and never runs
/// the pipeline.
#[derive(Debug)]
pub enum DecodedMessage {
    Order(Order),
    Poison { reason: String },
}

/// Unwrap the transport envelope and parse the inner order payload.
pub fn decode_message(body: &str) -> DecodedMessage {
    match try_decode(body) {
        Ok(order) => DecodedMessage::Order(order),
        Err(e) => DecodedMessage::Poison {
            reason: e.to_string(),
        },
    }
}

fn try_decode(body: &str) -> Result<Order, DecodeError> {
    let envelope: TransportEnvelope = serde_json::from_str(body).map_err(DecodeError::Envelope)?;
    let order: Order = serde_json::from_str(&envelope.message).map_err(DecodeError::Payload)?;
    Ok(order)
}
