//! Transport seam for device connections.
//!
//! The protocol core never touches sockets. A transport owns connection
//! setup, TLS, framing and reconnect; the core only needs whole frames in
//! and out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               HcDevice                   │
//! │   (handshake, dispatch, validation)     │
//! └──────────────────┬──────────────────────┘
//!                    │ send(&[u8]) / recv()
//!          ┌────────┴────────┐
//!          ▼                 ▼
//! ┌─────────────────┐ ┌─────────────────┐
//! │ socket transport│ │ MemoryTransport │
//! │   (external)    │ │ (tests, replay) │
//! └─────────────────┘ └─────────────────┘
//! ```

mod memory;

pub use memory::MemoryTransport;

use bytes::Bytes;

use crate::error::Result;

/// Framed, persistent connection to one device.
///
/// Calls are made from a single thread; `recv` is the only call expected to
/// block.
pub trait Transport {
    /// Open the connection
    fn connect(&mut self) -> Result<()>;

    /// Drop the current connection and open a new one
    fn reconnect(&mut self) -> Result<()>;

    /// Send one encoded frame
    fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive one frame; `Ok(None)` signals end-of-stream
    fn recv(&mut self) -> Result<Option<Bytes>>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn connect(&mut self) -> Result<()> {
        (**self).connect()
    }

    fn reconnect(&mut self) -> Result<()> {
        (**self).reconnect()
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame)
    }

    fn recv(&mut self) -> Result<Option<Bytes>> {
        (**self).recv()
    }
}
