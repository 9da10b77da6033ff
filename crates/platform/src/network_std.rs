//! `std::net` backed Network implementation for host builds.
//!
//! Blocking sockets wrapped in the async traits. On the host the executor
//! is a single-threaded `block_on`, so blocking inside the future is the
//! same cooperative model the firmware runs under.

use std::io::{Read as _, Write as _};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::network::{Connection, Network};

/// Socket timeout applied to connect, read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Host network interface.
pub struct StdNetwork {
    online: bool,
    timeout: Duration,
}

impl StdNetwork {
    /// Create an interface that reports itself connected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            online: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the socket timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Force the connectivity flag, e.g. to exercise offline handling.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }
}

impl Default for StdNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl Network for StdNetwork {
    type Error = std::io::Error;
    type Connection = StdConnection;

    fn is_connected(&self) -> bool {
        self.online
    }

    async fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection, Self::Error> {
        let mut last_err = std::io::Error::new(std::io::ErrorKind::NotFound, "host did not resolve");
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.timeout))?;
                    stream.set_write_timeout(Some(self.timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(StdConnection { stream });
                }
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

/// An open host TCP stream.
pub struct StdConnection {
    stream: TcpStream,
}

impl embedded_io_async::ErrorType for StdConnection {
    type Error = std::io::Error;
}

impl embedded_io_async::Read for StdConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf)
    }
}

impl embedded_io_async::Write for StdConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush()
    }
}

impl Connection for StdConnection {
    async fn close(self) {
        // The peer may already have closed its side.
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
