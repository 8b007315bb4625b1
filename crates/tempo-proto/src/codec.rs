//! CBOR codec for intents and events.
//!
//! One CBOR value per payload. Framing below this layer (length prefixes,
//! websocket messages, QUIC streams) belongs to the transport.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    errors::{ProtocolError, Result},
    event::ServerEvent,
    intent::ClientIntent,
};

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| ProtocolError::Encode(e.to_string()))?;
    Ok(buf)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
}

/// Encode an outgoing intent as a CBOR value.
pub fn encode_intent(intent: &ClientIntent) -> Result<Vec<u8>> {
    encode(intent)
}

/// Decode an outgoing intent from a CBOR value.
pub fn decode_intent(bytes: &[u8]) -> Result<ClientIntent> {
    decode(bytes)
}

/// Encode an incoming event as a CBOR value.
pub fn encode_event(event: &ServerEvent) -> Result<Vec<u8>> {
    encode(event)
}

/// Decode an incoming event from a CBOR value.
pub fn decode_event(bytes: &[u8]) -> Result<ServerEvent> {
    decode(bytes)
}
