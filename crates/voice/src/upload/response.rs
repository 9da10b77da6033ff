//! HTTP status line handling.
//!
//! Only the first line of the response is consulted. Headers and body are
//! left unread; the connection is closed right after.

use embedded_io_async::Read;
use heapless::Vec;

/// Longest status line kept. Anything past it is ignored.
pub const MAX_STATUS_LINE: usize = 128;

/// Raw status line bytes, trailing whitespace removed.
pub type RawStatusLine = Vec<u8, MAX_STATUS_LINE>;

/// HTTP versions the uploader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpVersion {
    /// `HTTP/1.0`
    Http10,
    /// `HTTP/1.1`
    Http11,
}

/// A parsed `HTTP/1.x NNN reason` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusLine {
    /// Protocol version.
    pub version: HttpVersion,
    /// Three-digit status code.
    pub code: u16,
}

impl StatusLine {
    /// Parse a trimmed status line.
    ///
    /// Only the version token and the code are matched; the reason phrase
    /// may hold any bytes, UTF-8 or not.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let mut parts = line.split(|&b| b == b' ');
        let version = match parts.next()? {
            b"HTTP/1.0" => HttpVersion::Http10,
            b"HTTP/1.1" => HttpVersion::Http11,
            _ => return None,
        };
        let code = parts.next()?;
        if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
            return None;
        }
        Some(Self {
            version,
            code: core::str::from_utf8(code).ok()?.parse().ok()?,
        })
    }

    /// The server stored the upload: 200 OK or 201 Created.
    pub fn is_accepted(&self) -> bool {
        matches!(self.code, 200 | 201)
    }
}

/// Read up to the first `\n` (or EOF, or [`MAX_STATUS_LINE`] bytes) and
/// trim trailing whitespace. The bytes are returned undecoded.
pub async fn read_status_line<R: Read>(reader: &mut R) -> Result<RawStatusLine, R::Error> {
    let mut raw = RawStatusLine::new();
    let mut byte = [0u8; 1];
    while !raw.is_full() {
        if reader.read(&mut byte).await? == 0 {
            break;
        }
        let [b] = byte;
        if b == b'\n' {
            break;
        }
        // Capacity checked by the loop condition.
        let _ = raw.push(b);
    }
    while raw.last().is_some_and(u8::is_ascii_whitespace) {
        raw.pop();
    }
    Ok(raw)
}

/// Longest UTF-8 prefix of `line`, for log output.
pub fn printable(line: &[u8]) -> &str {
    match core::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => line
            .get(..e.valid_up_to())
            .and_then(|valid| core::str::from_utf8(valid).ok())
            .unwrap_or(""),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    struct Canned<'a>(&'a [u8]);

    impl embedded_io_async::ErrorType for Canned<'_> {
        type Error = core::convert::Infallible;
    }

    impl Read for Canned<'_> {
        async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[tokio::test]
    async fn reads_first_line_only() {
        let mut r = Canned(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");
        assert_eq!(read_status_line(&mut r).await.unwrap().as_slice(), b"HTTP/1.1 201 Created");
    }

    #[tokio::test]
    async fn eof_without_newline() {
        let mut r = Canned(b"HTTP/1.0 200 OK");
        assert_eq!(read_status_line(&mut r).await.unwrap().as_slice(), b"HTTP/1.0 200 OK");
    }

    #[tokio::test]
    async fn empty_response() {
        let mut r = Canned(b"");
        assert!(read_status_line(&mut r).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn long_line_is_capped() {
        let long = [b'x'; MAX_STATUS_LINE * 2];
        let mut r = Canned(&long);
        assert_eq!(read_status_line(&mut r).await.unwrap().len(), MAX_STATUS_LINE);
    }

    #[test]
    fn accepts_200_and_201() {
        assert!(StatusLine::parse(b"HTTP/1.1 201 Created").unwrap().is_accepted());
        assert!(StatusLine::parse(b"HTTP/1.1 200 OK").unwrap().is_accepted());
        let old = StatusLine::parse(b"HTTP/1.0 200 OK").unwrap();
        assert_eq!(old.version, HttpVersion::Http10);
        assert!(old.is_accepted());
    }

    #[test]
    fn other_codes_are_rejected() {
        for line in ["HTTP/1.1 204 No Content", "HTTP/1.1 404 Not Found", "HTTP/1.1 500 Oops"] {
            assert!(!StatusLine::parse(line.as_bytes()).unwrap().is_accepted(), "{line}");
        }
    }

    #[test]
    fn malformed_lines_do_not_parse() {
        for line in ["", "HTTP/2 200 OK", "HTTP/1.1", "HTTP/1.1 20 OK", "HTTP/1.1 2000", "ICY 200 OK"] {
            assert_eq!(StatusLine::parse(line.as_bytes()), None, "{line}");
        }
    }

    #[tokio::test]
    async fn non_utf8_reason_keeps_the_code() {
        let mut r = Canned(b"HTTP/1.1 201 Cr\xe9\xe9\r\n\r\n");
        let line = read_status_line(&mut r).await.unwrap();
        assert_eq!(StatusLine::parse(&line).unwrap().code, 201);
        assert_eq!(printable(&line), "HTTP/1.1 201 Cr");
    }

    #[test]
    fn printable_stops_at_split_character() {
        assert_eq!(printable("HTTP/1.1 200 é".as_bytes()), "HTTP/1.1 200 é");
        assert_eq!(printable(&"HTTP/1.1 200 é".as_bytes()[..14]), "HTTP/1.1 200 ");
    }
}
