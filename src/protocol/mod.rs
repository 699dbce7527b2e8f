//! Device protocol: envelope, session, routing and write validation.
//!
//! Implements the client side of the appliance control channel: a JSON
//! envelope per frame, a session assigned by the device, per-service version
//! negotiation, and a fixed handshake before steady-state traffic.
//!
//! ## Message Flow
//!
//! ```text
//! Client                                   Device
//!    |                                       |
//!    |<------ POST /ei/initialValues --------|  sID + first msgID
//!    |------- RESPONSE (identity) ---------->|  same receive cycle
//!    |                                       |
//!    |------- GET /ci/services ------------->|
//!    |<------ NOTIFY (anything) -------------|  dispatched, tolerated
//!    |<------ RESPONSE /ci/services ---------|  service versions
//!    |                                       |
//!    |------- GET /ci/authentication ------->|  nonce
//!    |------- GET /ci/info, /iz/info ------->|
//!    |------- GET /ci/registeredDevices ---->|
//!    |------- NOTIFY /ei/deviceReady ------->|  before /ni/*
//!    |------- GET /ni/info ----------------->|
//!    |------- GET /ro/allMandatoryValues --->|
//!    |                                       |
//!    |<====== RESPONSE / NOTIFY =============|  normalized values
//!    |======= POST /ro/values =============>|  validated writes
//! ```
//!
//! ## State Machine
//!
//! | State                   | Left by                                |
//! |-------------------------|----------------------------------------|
//! | `Disconnected`          | transport connect                      |
//! | `AwaitingInitialValues` | POST `/ei/initialValues`               |
//! | `SessionEstablished`    | `/ci/services` response                |
//! | `ServicesDiscovered`    | handshake requests issued              |
//! | `Ready`                 | reconnect (back to `Disconnected`)     |

mod dispatch;
mod message;
mod request;
mod resource;
mod session;
mod validate;
mod values;

pub use dispatch::{Dispatched, Dispatcher, Inbound, Route};
pub use message::{Action, Envelope, Identity, SessionId};
pub use request::Request;
pub use resource::{service_of, Resource};
pub use session::{HandshakeState, Session};
pub use validate::{validate_programs, validate_request, validate_values, WriteKind};
pub use values::{normalize, Values};

/// Version used before services are known and for unlisted services
pub const DEFAULT_VERSION: u32 = 1;

/// `deviceType` of the identity reply
pub const DEVICE_TYPE: &str = "Application";

/// Random bytes in the authentication nonce
pub const NONCE_LEN: usize = 32;
