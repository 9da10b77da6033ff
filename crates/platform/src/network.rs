//! Network abstraction for outbound TCP
//!
//! The byte stream itself is an [`embedded_io_async`] reader/writer so the
//! same upload code runs over embassy-net sockets on hardware and over
//! `std::net` on the host.

use embedded_io_async::{Read, Write};

/// Station-mode network interface.
pub trait Network {
    /// Error type for connection establishment
    type Error: core::fmt::Debug;
    /// Connected stream type
    type Connection: Connection;

    /// Returns `true` when the link is up and an address has been assigned.
    fn is_connected(&self) -> bool;

    /// Open a TCP connection to `host:port`.
    ///
    /// `host` is either a dotted IPv4 literal or a name the interface can
    /// resolve.
    fn connect(
        &mut self,
        host: &str,
        port: u16,
    ) -> impl core::future::Future<Output = Result<Self::Connection, Self::Error>>;
}

/// An established TCP stream.
pub trait Connection: Read + Write {
    /// Shut the stream down and release the socket.
    fn close(self) -> impl core::future::Future<Output = ()>;
}
