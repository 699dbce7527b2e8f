//! Connection handshake.
//!
//! The request order after service discovery is fixed: several devices
//! answer `/ni/*` with 403 unless `/ei/deviceReady` was sent first.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bytes::Bytes;
use rand::RngCore;
use serde_json::json;

use super::HcDevice;
use crate::error::{HcError, Result};
use crate::protocol::{Action, HandshakeState, Request, Resource, NONCE_LEN};
use crate::transport::Transport;

/// Version the authentication and device-ready requests are pinned to
const HANDSHAKE_VERSION: u32 = 2;

impl<T: Transport> HcDevice<T> {
    /// Open the transport and run the handshake
    pub fn connect(&mut self) -> Result<()> {
        self.session.reset();
        self.transport.connect()?;
        self.handshake()
    }

    /// Drop the session, reopen the transport and run the handshake again.
    ///
    /// Nothing from the previous session is reused; responses still in
    /// flight on the old connection are lost.
    pub fn reconnect(&mut self) -> Result<()> {
        tracing::info!(device = %self.label, "Reconnecting");
        self.session.reset();
        self.transport.reconnect()?;
        self.handshake()
    }

    fn handshake(&mut self) -> Result<()> {
        self.session.set_state(HandshakeState::AwaitingInitialValues);

        // /ei/initialValues; the identity reply is sent while handling it
        let frame = self.handshake_frame()?;
        self.handle_frame(&frame)?;
        if self.session.state() != HandshakeState::SessionEstablished {
            return Err(HcError::Protocol(format!(
                "expected {} as the first message, got {}",
                Resource::InitialValues.path(),
                String::from_utf8_lossy(&frame)
            )));
        }

        // Registered devices get pushed down too, hence the loop
        self.get(Resource::Services.path())?;
        while !self.session.services_discovered() {
            let frame = self.handshake_frame()?;
            if let Err(e) = self.handle_frame(&frame) {
                tracing::warn!(device = %self.label, error = %e, "Error handling message");
            }
        }

        let nonce = self.nonce();
        self.session.set_auth_token(nonce.clone());
        self.send(
            Request::get(Resource::Authentication.path())
                .with_version(HANDSHAKE_VERSION)
                .with_data(json!({ "nonce": nonce })),
        )?;

        self.get(Resource::CiInfo.path())?;
        self.get(Resource::IzInfo.path())?;
        self.get(Resource::RegisteredDevices.path())?;
        self.send(
            Request::get(Resource::DeviceReady.path())
                .with_version(HANDSHAKE_VERSION)
                .with_action(Action::Notify),
        )?;
        self.get(Resource::NiInfo.path())?;
        self.get(Resource::AllMandatoryValues.path())?;

        self.session.set_state(HandshakeState::Ready);
        tracing::info!(
            device = %self.label,
            services = self.session.services().len(),
            "Handshake complete"
        );
        Ok(())
    }

    /// Next frame for the handshake. Receive faults are logged and skipped;
    /// only end-of-stream ends the wait.
    fn handshake_frame(&mut self) -> Result<Bytes> {
        loop {
            match self.transport.recv() {
                Ok(Some(frame)) => return Ok(frame),
                Ok(None) => return Err(HcError::ConnectionClosed),
                Err(e) => {
                    tracing::warn!(
                        device = %self.label,
                        error = %e,
                        "Receive error during handshake"
                    );
                },
            }
        }
    }

    /// 32 random bytes, URL-safe base64 without padding
    fn nonce(&mut self) -> String {
        let mut bytes = [0u8; NONCE_LEN];
        self.rng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn scripted() -> MemoryTransport {
        let mut transport = MemoryTransport::new();
        transport.push_json(&json!({
            "sID": 9, "msgID": 100, "resource": "/ei/initialValues",
            "version": 2, "action": "POST", "data": [{"edMsgID": 10}]
        }));
        transport.push_json(&json!({
            "sID": 9, "msgID": 101, "resource": "/ci/services",
            "version": 1, "action": "RESPONSE",
            "data": [{"service": "ci", "version": 3}, {"service": "ro", "version": 2}]
        }));
        transport
    }

    #[test]
    fn test_nonce_shape() {
        let mut device = HcDevice::new("x", MemoryTransport::new(), None)
            .with_rng(ChaCha8Rng::seed_from_u64(7));
        let nonce = device.nonce();

        assert_eq!(nonce.len(), 43);
        assert!(!nonce.contains('='));
        assert!(nonce
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_first_frame_must_be_initial_values() {
        let mut transport = MemoryTransport::new();
        transport.push_json(&json!({"resource": "/ro/values", "action": "NOTIFY", "data": []}));
        let mut device = HcDevice::new("x", transport, None);

        assert!(matches!(device.connect(), Err(HcError::Protocol(_))));
        assert_eq!(device.state(), HandshakeState::AwaitingInitialValues);
    }

    #[test]
    fn test_end_of_stream_fails_handshake() {
        let mut device = HcDevice::new("x", MemoryTransport::new(), None);
        assert!(matches!(device.connect(), Err(HcError::ConnectionClosed)));

        let mut transport = MemoryTransport::new();
        transport.push_json(&json!({
            "sID": 9, "msgID": 100, "resource": "/ei/initialValues",
            "version": 2, "action": "POST", "data": [{"edMsgID": 10}]
        }));
        let mut device = HcDevice::new("x", transport, None);
        assert!(matches!(device.connect(), Err(HcError::ConnectionClosed)));
        assert_eq!(device.state(), HandshakeState::SessionEstablished);
    }

    #[test]
    fn test_receive_faults_do_not_abort_discovery() {
        let mut transport = MemoryTransport::new();
        transport.push_fault("reset before hello");
        transport.push_json(&json!({
            "sID": 9, "msgID": 100, "resource": "/ei/initialValues",
            "version": 2, "action": "POST", "data": [{"edMsgID": 10}]
        }));
        transport.push_fault("transient reset");
        transport.push_json(&json!({
            "sID": 9, "msgID": 101, "resource": "/ci/services",
            "version": 1, "action": "RESPONSE", "data": [{"service": "ci", "version": 3}]
        }));
        let mut device = HcDevice::new("x", transport, None);

        device.connect().unwrap();

        assert_eq!(device.state(), HandshakeState::Ready);
        assert_eq!(device.transport().pending(), 0);
        assert_eq!(device.session().service_version("ci"), Some(3));
    }

    #[test]
    fn test_scripted_handshake_completes() {
        let mut device = HcDevice::new("x", scripted(), None);
        device.connect().unwrap();
        assert_eq!(device.state(), HandshakeState::Ready);
        assert_eq!(device.session().service_version("ro"), Some(2));
    }
}
