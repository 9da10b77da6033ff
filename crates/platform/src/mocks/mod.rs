//! Mock implementations for testing
//!
//! In-memory stand-ins for the storage, capture and network capabilities.
//! Each mock is a cheap handle over shared state: clone it before handing
//! it to the code under test and keep the clone to inspect what happened.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use thiserror_no_std::Error;

use crate::*;

/// Error produced by every mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MockError {
    /// Scripted mount failure.
    #[error("mount failed")]
    MountFailed,
    /// Operation attempted before a successful mount.
    #[error("card not mounted")]
    NotMounted,
    /// Path does not exist.
    #[error("no such file")]
    NotFound,
    /// Scripted open failure.
    #[error("open failed")]
    OpenFailed,
    /// Scripted I/O failure.
    #[error("I/O error")]
    Io,
    /// Scripted codec start failure.
    #[error("codec start failed")]
    CodecStart,
    /// Scripted connect failure.
    #[error("connection refused")]
    ConnectRefused,
}

impl embedded_io::Error for MockError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

// ── Storage ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Volume {
    files: BTreeMap<String, Vec<u8>>,
    mount_failures: usize,
    mount_attempts: Vec<MountConfig>,
    mounted: Option<MountConfig>,
    fail_open: bool,
    fail_writes: bool,
    open_handles: usize,
    removed: Vec<String>,
}

/// In-memory SD card.
#[derive(Clone, Default)]
pub struct MockStorage {
    volume: Rc<RefCell<Volume>>,
}

impl MockStorage {
    /// Card that mounts on the first attempt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Card that rejects the first `n` mount attempts.
    pub fn failing_mounts(n: usize) -> Self {
        let storage = Self::default();
        storage.volume.borrow_mut().mount_failures = n;
        storage
    }

    /// Every configuration `mount` was called with, in order.
    pub fn mount_attempts(&self) -> Vec<MountConfig> {
        self.volume.borrow().mount_attempts.clone()
    }

    /// Configuration of the successful mount, if any.
    pub fn mounted_config(&self) -> Option<MountConfig> {
        self.volume.borrow().mounted
    }

    /// Contents of `path`, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.volume.borrow().files.get(&normalize(path)).cloned()
    }

    /// Place a file on the card.
    pub fn insert(&self, path: &str, contents: &[u8]) {
        self.volume
            .borrow_mut()
            .files
            .insert(normalize(path), contents.to_vec());
    }

    /// Number of files on the card.
    pub fn file_count(&self) -> usize {
        self.volume.borrow().files.len()
    }

    /// Paths passed to a successful `remove`, in order.
    pub fn removed(&self) -> Vec<String> {
        self.volume.borrow().removed.clone()
    }

    /// File handles opened and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.volume.borrow().open_handles
    }

    /// Make every subsequent `open` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.volume.borrow_mut().fail_open = fail;
    }

    /// Make every subsequent file write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.volume.borrow_mut().fail_writes = fail;
    }
}

impl Storage for MockStorage {
    type Error = MockError;
    type File = MockFile;

    async fn mount(&mut self, config: MountConfig) -> Result<(), Self::Error> {
        let mut volume = self.volume.borrow_mut();
        volume.mount_attempts.push(config);
        if volume.mount_failures > 0 {
            volume.mount_failures -= 1;
            return Err(MockError::MountFailed);
        }
        volume.mounted = Some(config);
        Ok(())
    }

    async fn exists(&mut self, path: &str) -> Result<bool, Self::Error> {
        let volume = self.volume.borrow();
        if volume.mounted.is_none() {
            return Err(MockError::NotMounted);
        }
        Ok(volume.files.contains_key(&normalize(path)))
    }

    async fn remove(&mut self, path: &str) -> Result<(), Self::Error> {
        let mut volume = self.volume.borrow_mut();
        if volume.mounted.is_none() {
            return Err(MockError::NotMounted);
        }
        let key = normalize(path);
        volume.files.remove(&key).ok_or(MockError::NotFound)?;
        volume.removed.push(key);
        Ok(())
    }

    async fn open(&mut self, path: &str, mode: OpenMode) -> Result<Self::File, Self::Error> {
        let mut volume = self.volume.borrow_mut();
        if volume.mounted.is_none() {
            return Err(MockError::NotMounted);
        }
        if volume.fail_open {
            return Err(MockError::OpenFailed);
        }
        let key = normalize(path);
        match mode {
            OpenMode::Read => {
                if !volume.files.contains_key(&key) {
                    return Err(MockError::NotFound);
                }
            }
            OpenMode::WriteTruncate => {
                volume.files.insert(key.clone(), Vec::new());
            }
        }
        volume.open_handles += 1;
        Ok(MockFile {
            volume: Rc::clone(&self.volume),
            path: key,
            pos: 0,
        })
    }
}

/// Handle onto a file of a [`MockStorage`].
pub struct MockFile {
    volume: Rc<RefCell<Volume>>,
    path: String,
    pos: usize,
}

impl File for MockFile {
    type Error = MockError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let volume = self.volume.borrow();
        let data = volume.files.get(&self.path).ok_or(MockError::NotFound)?;
        let available = data.get(self.pos..).unwrap_or(&[]);
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut volume = self.volume.borrow_mut();
        if volume.fail_writes {
            return Err(MockError::Io);
        }
        let data = volume.files.get_mut(&self.path).ok_or(MockError::NotFound)?;
        let end = self.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[self.pos..end].copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }

    async fn seek(&mut self, pos: u64) -> Result<u64, Self::Error> {
        self.pos = usize::try_from(pos).map_err(|_| MockError::Io)?;
        Ok(pos)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn size(&self) -> u64 {
        self.volume
            .borrow()
            .files
            .get(&self.path)
            .map_or(0, |d| d.len() as u64)
    }
}

impl Drop for MockFile {
    fn drop(&mut self) {
        let mut volume = self.volume.borrow_mut();
        volume.open_handles = volume.open_handles.saturating_sub(1);
    }
}

// ── Capture ─────────────────────────────────────────────────────────────────

enum ReadStep {
    Data(Vec<u8>),
    Error,
}

#[derive(Default)]
struct CaptureState {
    queue: VecDeque<ReadStep>,
    fail_start: bool,
    capturing: bool,
    start_count: usize,
    stop_count: usize,
}

/// Scripted microphone codec.
///
/// Each queued chunk is handed out by one `read_samples` call (split if the
/// caller's buffer is smaller). An empty queue reads as an underrun.
#[derive(Clone, Default)]
pub struct MockCapture {
    state: Rc<RefCell<CaptureState>>,
}

impl MockCapture {
    /// Codec with an empty queue that starts successfully.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec whose `start_capture` always fails.
    pub fn failing_start() -> Self {
        let codec = Self::default();
        codec.state.borrow_mut().fail_start = true;
        codec
    }

    /// Queue one chunk of PCM for a future read.
    pub fn queue_chunk(&self, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .queue
            .push_back(ReadStep::Data(bytes.to_vec()));
    }

    /// Queue a read that fails.
    pub fn queue_read_error(&self) {
        self.state.borrow_mut().queue.push_back(ReadStep::Error);
    }

    /// Returns `true` between a successful start and the next stop.
    pub fn is_capturing(&self) -> bool {
        self.state.borrow().capturing
    }

    /// Number of `start_capture` calls.
    pub fn start_count(&self) -> usize {
        self.state.borrow().start_count
    }

    /// Number of `stop_capture` calls.
    pub fn stop_count(&self) -> usize {
        self.state.borrow().stop_count
    }
}

impl AudioCapture for MockCapture {
    type Error = MockError;

    async fn start_capture(&mut self) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.start_count += 1;
        if state.fail_start {
            return Err(MockError::CodecStart);
        }
        state.capturing = true;
        Ok(())
    }

    async fn stop_capture(&mut self) {
        let mut state = self.state.borrow_mut();
        state.stop_count += 1;
        state.capturing = false;
    }

    async fn read_samples(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut state = self.state.borrow_mut();
        if !state.capturing {
            return Ok(0);
        }
        match state.queue.pop_front() {
            None => Ok(0),
            Some(ReadStep::Error) => Err(MockError::Io),
            Some(ReadStep::Data(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    let rest = chunk.split_off(n);
                    state.queue.push_front(ReadStep::Data(rest));
                }
                Ok(n)
            }
        }
    }
}

// ── Network ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Link {
    online: bool,
    refuse_connect: bool,
    fail_writes: bool,
    response: Vec<u8>,
    connects: Vec<(String, u16)>,
    sent: Vec<u8>,
    open_connections: usize,
    closed: usize,
}

/// Scripted network link with a canned HTTP response.
#[derive(Clone)]
pub struct MockNetwork {
    link: Rc<RefCell<Link>>,
}

impl MockNetwork {
    /// Online link whose server answers with `response`.
    pub fn responding(response: &[u8]) -> Self {
        Self {
            link: Rc::new(RefCell::new(Link {
                online: true,
                response: response.to_vec(),
                ..Link::default()
            })),
        }
    }

    /// Link that reports no connectivity.
    pub fn offline() -> Self {
        let net = Self::responding(b"");
        net.link.borrow_mut().online = false;
        net
    }

    /// Make every connect attempt fail.
    pub fn set_refuse_connect(&self, refuse: bool) {
        self.link.borrow_mut().refuse_connect = refuse;
    }

    /// Make every write on an open connection fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.link.borrow_mut().fail_writes = fail;
    }

    /// Every `(host, port)` passed to `connect`.
    pub fn connects(&self) -> Vec<(String, u16)> {
        self.link.borrow().connects.clone()
    }

    /// All bytes written by the client across connections.
    pub fn sent(&self) -> Vec<u8> {
        self.link.borrow().sent.clone()
    }

    /// Connections opened and not yet dropped.
    pub fn open_connections(&self) -> usize {
        self.link.borrow().open_connections
    }

    /// Number of explicit `close` calls.
    pub fn closed(&self) -> usize {
        self.link.borrow().closed
    }
}

impl Network for MockNetwork {
    type Error = MockError;
    type Connection = MockConnection;

    fn is_connected(&self) -> bool {
        self.link.borrow().online
    }

    async fn connect(&mut self, host: &str, port: u16) -> Result<Self::Connection, Self::Error> {
        let mut link = self.link.borrow_mut();
        link.connects.push((host.to_string(), port));
        if link.refuse_connect {
            return Err(MockError::ConnectRefused);
        }
        link.open_connections += 1;
        Ok(MockConnection {
            link: Rc::clone(&self.link),
            read_pos: 0,
        })
    }
}

/// Client side of a [`MockNetwork`] connection.
pub struct MockConnection {
    link: Rc<RefCell<Link>>,
    read_pos: usize,
}

impl embedded_io_async::ErrorType for MockConnection {
    type Error = MockError;
}

impl embedded_io_async::Read for MockConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let link = self.link.borrow();
        let rest = link.response.get(self.read_pos..).unwrap_or(&[]);
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for MockConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut link = self.link.borrow_mut();
        if link.fail_writes {
            return Err(MockError::Io);
        }
        link.sent.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for MockConnection {
    async fn close(self) {
        self.link.borrow_mut().closed += 1;
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        let mut link = self.link.borrow_mut();
        link.open_connections = link.open_connections.saturating_sub(1);
    }
}
