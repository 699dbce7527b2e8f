//! Per-connection session state.
//!
//! One [`Session`] exists per device connection. It is empty when the
//! connection is created, filled in across the handshake, and wiped on every
//! reconnect. Nothing (message ids, tokens, service versions) survives a
//! reconnect.

use std::collections::HashMap;

use super::message::SessionId;
use super::resource::service_of;
use crate::error::{HcError, Result};

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No transport connection
    Disconnected,
    /// Connected, waiting for `/ei/initialValues`
    AwaitingInitialValues,
    /// Session id and message ids assigned, services unknown
    SessionEstablished,
    /// `/ci/services` answered
    ServicesDiscovered,
    /// Handshake requests issued, steady state
    Ready,
}

/// Device protocol session
#[derive(Debug, Clone)]
pub struct Session {
    /// Current handshake state
    state: HandshakeState,
    /// Token assigned by the device
    session_id: Option<SessionId>,
    /// Id for the next outbound message
    next_message_id: Option<u64>,
    /// Service name -> protocol version
    services: HashMap<String, u32>,
    /// Whether `/ci/services` was answered
    services_discovered: bool,
    /// Authentication token (our nonce, then the device's response)
    auth_token: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Disconnected,
            session_id: None,
            next_message_id: None,
            services: HashMap::new(),
            services_discovered: false,
            auth_token: None,
        }
    }

    /// Discard everything
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Get current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Get the session token
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Id the next outbound message will carry
    pub fn next_message_id(&self) -> Option<u64> {
        self.next_message_id
    }

    /// Whether service versions are known
    pub fn services_discovered(&self) -> bool {
        self.services_discovered
    }

    /// Negotiated version of a service
    pub fn service_version(&self, service: &str) -> Option<u32> {
        self.services.get(service).copied()
    }

    /// All negotiated services
    pub fn services(&self) -> &HashMap<String, u32> {
        &self.services
    }

    /// Current authentication token
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub(crate) fn set_state(&mut self, state: HandshakeState) {
        self.state = state;
    }

    /// Adopt the ids delivered by `/ei/initialValues`
    pub(crate) fn establish(&mut self, session_id: Option<SessionId>, first_message_id: u64) {
        self.session_id = session_id;
        self.next_message_id = Some(first_message_id);
        self.state = HandshakeState::SessionEstablished;
    }

    /// Store the `/ci/services` table
    pub(crate) fn record_services(&mut self, services: impl IntoIterator<Item = (String, u32)>) {
        self.services.extend(services);
        self.services_discovered = true;
        if self.state == HandshakeState::SessionEstablished {
            self.state = HandshakeState::ServicesDiscovered;
        }
    }

    pub(crate) fn set_auth_token(&mut self, token: String) {
        self.auth_token = Some(token);
    }

    /// Id for the message about to be sent.
    pub(crate) fn current_message_id(&self) -> Result<u64> {
        self.next_message_id.ok_or(HcError::SessionNotEstablished)
    }

    /// Move past a message id once the message was handed to the transport.
    ///
    /// Ids never wrap. Once the last id has been used the counter is cleared,
    /// so further sends fail until the session is re-established.
    pub(crate) fn advance_message_id(&mut self) -> Result<()> {
        let Some(id) = self.next_message_id else {
            return Err(HcError::SessionNotEstablished);
        };
        self.next_message_id = id.checked_add(1);
        if self.next_message_id.is_none() {
            return Err(HcError::Protocol(format!(
                "message id space exhausted at {id}, reconnect required"
            )));
        }
        Ok(())
    }

    /// Version to put on a request for `resource`.
    ///
    /// An explicit version always wins. Otherwise, once services are known,
    /// the version of the path's service segment is used; a segment the
    /// device did not list falls back to `default` with a warning.
    pub fn resolve_version(&self, resource: &str, explicit: Option<u32>, default: u32) -> u32 {
        if let Some(version) = explicit {
            return version;
        }
        if !self.services_discovered {
            return default;
        }
        match service_of(resource) {
            Some(service) => match self.services.get(service) {
                Some(version) => *version,
                None => {
                    tracing::warn!(
                        resource,
                        service,
                        default,
                        "Service not known, sending with default version"
                    );
                    default
                },
            },
            None => default,
        }
    }
}
