//! Device protocol error types.
//!
//! # Error Classification
//!
//! Errors fall into two families that are never merged:
//!
//! - **Write validation** ([`ValidationError`]): a mutating payload broke a
//!   rule of the feature catalog. These are caller bugs and are returned
//!   synchronously before anything reaches the wire.
//! - **Protocol and transport anomalies** (the remaining [`HcError`]
//!   variants): malformed frames, handshake ordering problems and socket
//!   faults. Inside the receive loop these are logged and dropped; the
//!   handshake surfaces them to its caller.
//!
//! Device-reported error frames (an envelope carrying `code`) are not errors
//! at all. They are delivered as normalized values.

use thiserror::Error;

/// Device protocol errors.
#[derive(Error, Debug)]
pub enum HcError {
    /// Inbound bytes were not a well-formed envelope.
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Well-formed frame that violates the handshake or payload contract.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Outbound request attempted before the device assigned message ids.
    #[error("Session not established")]
    SessionNotEstablished,

    /// Transport reached end-of-stream while the handshake still needed frames.
    #[error("Connection closed during handshake")]
    ConnectionClosed,

    /// Socket level failure reported by the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Outbound payload rejected by the write validator.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for device protocol operations
pub type Result<T> = std::result::Result<T, HcError>;

impl From<toml::de::Error> for HcError {
    fn from(err: toml::de::Error) -> Self {
        HcError::Config(err.to_string())
    }
}

/// Reasons a mutating payload is refused before it is sent.
///
/// Each variant names the identifier that caused the rejection so the
/// message can be shown to whoever wrote the offending configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No feature catalog was supplied, so nothing can be checked.
    #[error("Unable to configure appliance. No feature catalog is loaded.")]
    NoCatalog,

    /// Value record without a `uid`.
    #[error("Unable to configure appliance. UID is required.")]
    MissingUid,

    /// `uid` present but not an integer.
    #[error("Unable to configure appliance. UID must be an integer, got {uid}.")]
    UidNotInteger {
        /// Raw uid as supplied
        uid: String,
    },

    /// Value record without a `value`.
    #[error("Unable to configure appliance. Value is required for UID {uid}.")]
    MissingValue {
        /// Feature uid
        uid: String,
    },

    /// `uid` absent from the feature catalog.
    #[error("Unable to configure appliance. UID {uid} is not valid.")]
    UnknownFeature {
        /// Feature uid
        uid: String,
    },

    /// Descriptor declares no access level.
    #[error("Unable to configure appliance. Feature {name} with uid {uid} does not have access.")]
    NoAccess {
        /// Feature uid
        uid: String,
        /// Feature display name
        name: String,
    },

    /// Descriptor access level forbids writes.
    #[error("Unable to configure appliance. Feature {name} with uid {uid} has got access {access}.")]
    NotWritable {
        /// Feature uid
        uid: String,
        /// Feature display name
        name: String,
        /// Access level as declared
        access: String,
    },

    /// Enumerated or ranged feature given a non-integer value.
    #[error("Unable to configure appliance. The value {value} for UID {uid} must be an integer.")]
    ValueNotInteger {
        /// Feature uid
        uid: String,
        /// Raw value as supplied
        value: String,
    },

    /// Value is not one of the enumerated keys.
    #[error("Unable to configure appliance. Value {value} is not a valid value for UID {uid}. Allowed values are {allowed}.")]
    ValueNotAllowed {
        /// Feature uid
        uid: String,
        /// Raw value as supplied
        value: String,
        /// Comma separated enumeration keys
        allowed: String,
    },

    /// Value outside the declared inclusive range.
    #[error("Unable to configure appliance. Value {value} is not a valid value for UID {uid}. The value must be an integer in the range {min} and {max}.")]
    OutOfRange {
        /// Feature uid
        uid: String,
        /// Supplied value
        value: i64,
        /// Lower bound, or `-inf`
        min: String,
        /// Upper bound, or `inf`
        max: String,
    },

    /// Program record without a `program` field.
    #[error("Message data invalid, no program specified.")]
    MissingProgram,

    /// `program` present but not an integer.
    #[error("Message data invalid, UID in 'program' must be an integer, got {uid}.")]
    ProgramNotInteger {
        /// Raw program id as supplied
        uid: String,
    },

    /// Program id absent from the feature catalog.
    #[error("Unable to configure appliance. Program UID {uid} is not valid for this device.")]
    UnknownProgram {
        /// Program uid
        uid: String,
    },

    /// Program id resolves to a feature that is not a program.
    #[error("Unable to configure appliance. Program UID {uid} is not a valid program - {name}.")]
    NotAProgram {
        /// Program uid
        uid: String,
        /// Feature display name
        name: String,
    },

    /// `options` is not a list of option records.
    #[error("Unable to configure appliance. Options for program {program} must be a list of records with a uid.")]
    InvalidOptions {
        /// Program uid
        program: String,
    },

    /// Option id absent from the feature catalog.
    #[error("Unable to configure appliance. Option UID {uid} is not valid for this device.")]
    UnknownOption {
        /// Option uid
        uid: String,
    },
}
