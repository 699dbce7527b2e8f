//! # hcdev - Home Appliance Device-Control Protocol
//!
//! Client-side handler for the persistent, message-framed JSON channel that
//! home appliances expose. It turns raw frames into typed events, keeps the
//! per-connection session, negotiates service versions, validates writes
//! against the device's feature catalog and drives the handshake that must
//! complete before steady-state traffic.
//!
//! ## Architecture
//!
//! ```text
//!            caller
//!              │ connect / reconnect / recv / send
//!              ▼
//!  ┌──────────────────────────────────────────┐
//!  │                HcDevice                   │
//!  │  handshake ─ session ─ dispatcher         │
//!  │                 │           │             │
//!  │          write validator  value normalizer│
//!  │                 └─── feature catalog ─────│
//!  └──────────────────┬───────────────────────┘
//!                     │ envelope codec
//!                     ▼
//!                 Transport
//! ```
//!
//! ## Error Model
//!
//! | Kind                        | Handling                                   |
//! |-----------------------------|--------------------------------------------|
//! | Transport fault             | logged, `recv` returns `None`, send is best-effort |
//! | Malformed frame             | logged with the raw bytes, frame dropped   |
//! | Device error frame (`code`) | delivered as `{error, resource}` values    |
//! | Validation failure          | returned to the caller, nothing sent       |
//! | Unrecognized frame          | logged at debug, ignored                   |
//!
//! ## Quick Start
//!
//! ```rust
//! use hcdev::{FeatureCatalog, HcDevice, MemoryTransport};
//! use serde_json::json;
//!
//! let catalog = FeatureCatalog::from_json(r#"{
//!     "539": {"name": "BSH.Common.Setting.PowerState", "access": "readWrite",
//!             "values": {"1": "Off", "2": "On"}}
//! }"#).unwrap();
//!
//! let mut transport = MemoryTransport::new();
//! transport.push_json(&json!({"sID": 1, "msgID": 1, "resource": "/ei/initialValues",
//!                             "version": 2, "action": "POST", "data": [{"edMsgID": 10}]}));
//! transport.push_json(&json!({"sID": 1, "msgID": 2, "resource": "/ci/services",
//!                             "version": 1, "action": "RESPONSE",
//!                             "data": [{"service": "ro", "version": 1}]}));
//! transport.push_json(&json!({"sID": 1, "msgID": 3, "resource": "/ro/values",
//!                             "version": 1, "action": "NOTIFY",
//!                             "data": [{"uid": 539, "value": 2}]}));
//!
//! let mut device = HcDevice::new("dishwasher", transport, Some(catalog));
//! device.connect().unwrap();
//!
//! let values = device.recv().unwrap();
//! assert_eq!(values["PowerState"], "On");
//!
//! // Writes are checked against the catalog before they are sent
//! assert!(device.set_values(json!({"uid": 539, "value": 9})).is_err());
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: envelope, session, routing, validation, normalization
//! - [`device`]: connection handler and handshake
//! - [`catalog`]: feature descriptors
//! - [`transport`]: transport seam and in-memory transport
//! - [`config`]: configuration management
//! - [`error`]: error types and result aliases

pub mod catalog;
pub mod config;
pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use catalog::{Access, FeatureCatalog, FeatureDescriptor, FeatureId};
pub use config::Config;
pub use device::HcDevice;
pub use error::{HcError, Result, ValidationError};
pub use protocol::{Action, Envelope, HandshakeState, Request, Session, Values};
pub use transport::{MemoryTransport, Transport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
