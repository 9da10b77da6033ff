//! Upload endpoint parsing.
//!
//! Only plain `http://host[:port]/path` is accepted. The URL is parsed on
//! every upload, so a bad configuration shows up as [`Status::BadUrl`] at
//! the moment the user asks for an upload.
//!
//! [`Status::BadUrl`]: crate::Status::BadUrl

use heapless::String;
use thiserror_no_std::Error;

/// The only supported scheme.
pub const SCHEME: &str = "http://";

/// Port used when the URL does not name one.
pub const DEFAULT_PORT: u16 = 80;

/// Capacity of the host component.
pub const MAX_HOST_LEN: usize = 64;

/// Capacity of the path component.
pub const MAX_PATH_LEN: usize = 128;

/// Why an upload URL was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UrlError {
    /// Does not start with `http://`.
    #[error("URL must start with http://")]
    UnsupportedScheme,
    /// No `/` after the authority.
    #[error("URL has no path")]
    MissingPath,
    /// Nothing between the scheme and the path or port.
    #[error("URL has an empty host")]
    EmptyHost,
    /// Port is not a number in 1..=65535.
    #[error("URL port is invalid")]
    InvalidPort,
    /// Host or path does not fit its buffer.
    #[error("URL component too long")]
    TooLong,
}

/// Parsed destination of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Host name or dotted address.
    pub host: String<MAX_HOST_LEN>,
    /// TCP port.
    pub port: u16,
    /// Request path including the leading `/`.
    pub path: String<MAX_PATH_LEN>,
}

impl UploadTarget {
    /// Split `url` into host, port and path.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        let rest = url.strip_prefix(SCHEME).ok_or(UrlError::UnsupportedScheme)?;
        let slash = rest.find('/').ok_or(UrlError::MissingPath)?;
        let (authority, path) = rest.split_at(slash);

        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (authority, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(UrlError::EmptyHost);
        }

        Ok(Self {
            host: String::try_from(host).map_err(|_| UrlError::TooLong)?,
            port,
            path: String::try_from(path).map_err(|_| UrlError::TooLong)?,
        })
    }
}

fn parse_port(raw: &str) -> Result<u16, UrlError> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(UrlError::InvalidPort),
        Ok(port) => Ok(port),
    }
}
