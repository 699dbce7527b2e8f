//! Wire envelope for device frames.
//!
//! Every frame in either direction is one JSON object with the keys
//! `sID`, `msgID`, `resource`, `version`, `action` and optionally `data`
//! and `code`. Encoding and decoding are pure and stateless.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DEFAULT_VERSION, DEVICE_TYPE};
use crate::error::{HcError, Result};

/// Message verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Client read request
    Get,
    /// Write request (either direction)
    Post,
    /// Reply to a request
    Response,
    /// Unsolicited push
    Notify,
    /// Any verb outside the protocol vocabulary
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "GET",
            Action::Post => "POST",
            Action::Response => "RESPONSE",
            Action::Notify => "NOTIFY",
            Action::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session token assigned by the device, echoed on every frame.
///
/// Devices send an integer today; the value is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Value);

impl SessionId {
    /// Wrap a raw JSON token
    pub fn new(raw: impl Into<Value>) -> Self {
        Self(raw.into())
    }

    /// Raw JSON token
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Protocol message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Session token
    #[serde(rename = "sID", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Message id
    #[serde(rename = "msgID", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
    /// Slash-delimited resource path
    pub resource: String,
    /// Service version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Verb
    pub action: Action,
    /// Ordered records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    /// Device error indicator, usually an HTTP-like integer. Kept as raw
    /// JSON so an unexpected type still reaches the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Identity record sent in reply to the initial-values frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Always `Application`
    #[serde(rename = "deviceType")]
    pub device_type: String,
    /// Client name shown in the device's registered clients
    #[serde(rename = "deviceName")]
    pub device_name: String,
    /// Client id
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

impl Identity {
    /// Create an application identity
    pub fn new(device_name: &str, device_id: &str) -> Self {
        Self {
            device_type: DEVICE_TYPE.to_string(),
            device_name: device_name.to_string(),
            device_id: device_id.to_string(),
        }
    }
}

impl Envelope {
    /// Create an outbound request
    pub fn request(
        session_id: Option<SessionId>,
        message_id: u64,
        resource: &str,
        version: u32,
        action: Action,
        data: Option<Vec<Value>>,
    ) -> Self {
        Self {
            session_id,
            message_id: Some(message_id),
            resource: resource.to_string(),
            version,
            action,
            data,
            code: None,
        }
    }

    /// Create a RESPONSE echoing the ids, resource and version of `msg`
    pub fn reply(msg: &Envelope, record: Value) -> Self {
        Self {
            session_id: msg.session_id.clone(),
            message_id: msg.message_id,
            resource: msg.resource.clone(),
            version: msg.version,
            action: Action::Response,
            data: Some(vec![record]),
            code: None,
        }
    }

    /// First data record, if any
    pub fn first_record(&self) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.first())
    }

    /// Encode to wire bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode wire bytes.
    ///
    /// Anything that is not a JSON object with `resource` and `action`
    /// fails with [`HcError::MalformedMessage`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| HcError::MalformedMessage(e.to_string()))
    }
}
