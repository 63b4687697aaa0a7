//! Wire format shared by the client and the procedure host.
//!
//! Each message is one JSON document terminated by a newline. The client
//! writes [`Invocation`]s and the server answers every invocation with
//! exactly one [`ClientResponse`](crate::ClientResponse) echoing its
//! `client_handle`.

use crate::Value;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::codec::LinesCodec;

/// Port the procedure host listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 21212;

/// Upper bound for a single encoded message
pub const MAX_MESSAGE_LENGTH: usize = 16 * 1024 * 1024;

/// A named procedure call with positional parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub client_handle: u64,
    pub procedure: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

impl Invocation {
    pub fn new<S: Into<String>>(client_handle: u64, procedure: S, parameters: Vec<Value>) -> Self {
        Self {
            client_handle,
            procedure: procedure.into(),
            parameters,
        }
    }
}

/// Line codec bounded by [`MAX_MESSAGE_LENGTH`]
#[must_use]
pub fn codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_MESSAGE_LENGTH)
}

/// Encode a message as a single line (without the terminator).
///
/// # Errors
/// * If the message cannot be serialized
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a message from a single line.
///
/// # Errors
/// * [`ProtocolError`](crate::Error::ProtocolError) if the line is not a valid message
pub fn decode<T: DeserializeOwned>(line: &str) -> Result<T> {
    Ok(serde_json::from_str(line)?)
}
