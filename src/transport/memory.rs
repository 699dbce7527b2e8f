//! Scripted in-memory transport.
//!
//! Inbound frames and faults are queued up front; outbound frames are
//! recorded. Used by the test suite and by `hcdev replay` to push captured
//! traffic through the protocol core.

use std::collections::VecDeque;

use bytes::Bytes;
use serde_json::Value;

use super::Transport;
use crate::error::{HcError, Result};
use crate::protocol::Envelope;

#[derive(Debug, Clone)]
enum Scripted {
    Frame(Bytes),
    Fault(String),
}

/// In-memory transport
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Scripted>,
    sent: Vec<Bytes>,
    connected: bool,
    fail_sends: bool,
    connects: usize,
    reconnects: usize,
}

impl MemoryTransport {
    /// Create an empty, disconnected transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw inbound frame
    pub fn push_frame(&mut self, frame: impl Into<Bytes>) {
        self.inbound.push_back(Scripted::Frame(frame.into()));
    }

    /// Queue an inbound JSON frame
    pub fn push_json(&mut self, frame: &Value) {
        self.push_frame(frame.to_string());
    }

    /// Queue a receive failure
    pub fn push_fault(&mut self, reason: &str) {
        self.inbound.push_back(Scripted::Fault(reason.to_string()));
    }

    /// Make every subsequent send fail
    pub fn set_fail_sends(&mut self, fail: bool) {
        self.fail_sends = fail;
    }

    /// Frames still queued
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Frames sent so far
    pub fn sent(&self) -> &[Bytes] {
        &self.sent
    }

    /// Sent frames decoded as envelopes
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent
            .iter()
            .filter_map(|frame| Envelope::decode(frame).ok())
            .collect()
    }

    /// Forget sent frames
    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    /// Whether `connect`/`reconnect` was called
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Number of `connect` calls
    pub fn connects(&self) -> usize {
        self.connects
    }

    /// Number of `reconnect` calls
    pub fn reconnects(&self) -> usize {
        self.reconnects
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self) -> Result<()> {
        self.connects += 1;
        self.connected = true;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        self.reconnects += 1;
        self.connected = true;
        Ok(())
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(HcError::Transport("not connected".to_string()));
        }
        if self.fail_sends {
            return Err(HcError::Transport("send failed".to_string()));
        }
        self.sent.push(Bytes::copy_from_slice(frame));
        Ok(())
    }

    fn recv(&mut self) -> Result<Option<Bytes>> {
        match self.inbound.pop_front() {
            Some(Scripted::Frame(frame)) => Ok(Some(frame)),
            Some(Scripted::Fault(reason)) => Err(HcError::Transport(reason)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scripted_order() {
        let mut transport = MemoryTransport::new();
        transport.push_json(&json!({"resource": "/ro/values", "action": "NOTIFY"}));
        transport.push_fault("reset by peer");

        assert!(transport.recv().unwrap().is_some());
        assert!(matches!(transport.recv(), Err(HcError::Transport(_))));
        assert!(transport.recv().unwrap().is_none());
    }

    #[test]
    fn test_send_requires_connection() {
        let mut transport = MemoryTransport::new();
        assert!(transport.send(b"{}").is_err());

        transport.connect().unwrap();
        transport.send(b"{}").unwrap();
        assert_eq!(transport.sent().len(), 1);

        transport.set_fail_sends(true);
        assert!(transport.send(b"{}").is_err());
        assert_eq!(transport.sent().len(), 1);
    }
}
