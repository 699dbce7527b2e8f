//! Device handler: one connection, one session.
//!
//! [`HcDevice`] ties a [`Transport`] to the protocol core. It runs the
//! handshake, turns inbound frames into normalized values and sends
//! validated requests. Everything happens on the caller's thread; the only
//! blocking point is the transport's `recv`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hcdev::{FeatureCatalog, HcDevice, Request};
//!
//! let catalog = FeatureCatalog::load("dishwasher.json")?;
//! let mut device = HcDevice::new("dishwasher", socket, Some(catalog));
//! device.connect()?;
//!
//! loop {
//!     if let Some(values) = device.recv() {
//!         println!("{}", serde_json::Value::Object(values));
//!     }
//! }
//! ```

mod handshake;

use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::Value;

use crate::catalog::FeatureCatalog;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::{
    validate_request, Dispatcher, Envelope, HandshakeState, Identity, Inbound, Request, Resource,
    Session, Values, DEFAULT_VERSION,
};
use crate::transport::Transport;

/// Client-side protocol handler for one appliance
pub struct HcDevice<T: Transport> {
    /// Human label for logs
    label: String,
    /// Framed connection
    transport: T,
    /// Feature catalog, read-only
    catalog: Option<FeatureCatalog>,
    /// Identity for the initial-values reply
    identity: Identity,
    /// Version when nothing better is known
    default_version: u32,
    /// Session for the current connection
    session: Session,
    /// Inbound routing table
    dispatcher: Dispatcher,
    /// Entropy for the authentication nonce
    rng: Box<dyn RngCore + Send>,
}

impl<T: Transport> HcDevice<T> {
    /// Create a handler; nothing is sent until [`connect`](Self::connect)
    pub fn new(label: &str, transport: T, catalog: Option<FeatureCatalog>) -> Self {
        let client = ClientConfig::default();
        Self {
            label: label.to_string(),
            transport,
            catalog,
            identity: client.identity(),
            default_version: DEFAULT_VERSION,
            session: Session::new(),
            dispatcher: Dispatcher::new(),
            rng: Box::new(OsRng),
        }
    }

    /// Apply client identity and defaults
    pub fn with_client(mut self, client: &ClientConfig) -> Self {
        self.identity = client.identity();
        self.default_version = client.default_version;
        self
    }

    /// Replace the nonce entropy source
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Device label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current handshake state
    pub fn state(&self) -> HandshakeState {
        self.session.state()
    }

    /// Feature catalog
    pub fn catalog(&self) -> Option<&FeatureCatalog> {
        self.catalog.as_ref()
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Underlying transport (mutable)
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// GET a resource
    pub fn get(&mut self, resource: &str) -> Result<()> {
        self.send(Request::get(resource))
    }

    /// POST `{uid, value}` records to `/ro/values`
    pub fn set_values(&mut self, records: Value) -> Result<()> {
        self.send(Request::post(Resource::Values.path(), records))
    }

    /// POST `{program, options}` records to `/ro/activeProgram`
    pub fn start_program(&mut self, records: Value) -> Result<()> {
        self.send(Request::post(Resource::ActiveProgram.path(), records))
    }

    /// Send a request.
    ///
    /// Mutating writes are validated first; a validation error is returned
    /// and nothing is sent. A transport failure is logged and swallowed.
    /// Either way a sent request consumes exactly one message id; sending
    /// with the last id of the space fails with [`HcError::Protocol`].
    ///
    /// [`HcError::Protocol`]: crate::error::HcError::Protocol
    pub fn send(&mut self, request: Request) -> Result<()> {
        let Request {
            resource,
            version,
            action,
            data,
        } = request;

        if let Some(records) = &data {
            validate_request(self.catalog.as_ref(), action, &resource, records)?;
        }

        let message_id = self.session.current_message_id()?;
        let version = self
            .session
            .resolve_version(&resource, version, self.default_version);

        let msg = Envelope::request(
            self.session.session_id().cloned(),
            message_id,
            &resource,
            version,
            action,
            data,
        );
        let frame = msg.encode()?;

        self.transmit(&frame, &msg);
        self.session.advance_message_id()
    }

    /// Receive and handle one frame.
    ///
    /// Returns `None` on end-of-stream, on a transport fault and on any
    /// frame that fails to decode or handle; the fault is logged. Otherwise
    /// returns the frame's values, possibly empty.
    pub fn recv(&mut self) -> Option<Values> {
        let frame = match self.transport.recv() {
            Ok(Some(frame)) => frame,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(device = %self.label, error = %e, "Receive error");
                return None;
            },
        };

        match self.handle_frame(&frame) {
            Ok(values) => Some(values),
            Err(e) => {
                tracing::warn!(
                    device = %self.label,
                    error = %e,
                    frame = %String::from_utf8_lossy(&frame),
                    "Error handling message"
                );
                None
            },
        }
    }

    /// Dispatch one frame and send any reply it requires
    fn handle_frame(&mut self, frame: &[u8]) -> Result<Values> {
        let mut cx = Inbound {
            session: &mut self.session,
            catalog: self.catalog.as_ref(),
            identity: &self.identity,
            label: &self.label,
        };
        let out = self.dispatcher.dispatch(&mut cx, frame)?;

        if let Some(reply) = out.reply {
            let bytes = reply.encode()?;
            self.transmit(&bytes, &reply);
        }
        Ok(out.values)
    }

    /// Best-effort send
    fn transmit(&mut self, frame: &[u8], msg: &Envelope) {
        tracing::debug!(
            device = %self.label,
            resource = %msg.resource,
            action = %msg.action,
            msg_id = ?msg.message_id,
            "TX"
        );
        if let Err(e) = self.transport.send(frame) {
            tracing::warn!(
                device = %self.label,
                error = %e,
                resource = %msg.resource,
                "Failed to send"
            );
        }
    }
}
