//! Console input/output with bounded waits

use async_trait::async_trait;
use std::io::{self, Write};
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Result of a read that is allowed to give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimedInput {
    /// Input arrived in time. `None` for a blank line or end of input.
    Ready(Option<String>),
    TimedOut,
}

#[async_trait]
pub trait Console: Send {
    /// User-facing output.
    fn say(&mut self, text: &str);

    /// Prompts and waits for the first non-blank token. `None` at end of input.
    async fn read_token(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Prompts and waits at most `limit` for a line.
    async fn read_token_within(&mut self, prompt: &str, limit: Duration) -> io::Result<TimedInput>;

    /// Drops any input typed but not yet read.
    fn discard_pending(&mut self);
}

/// First whitespace-delimited token of a line.
pub fn first_token(line: &str) -> Option<String> {
    line.split_whitespace().next().map(str::to_string)
}

/// Line reader over a raw descriptor with its own buffer, so readiness
/// checks and discards also cover bytes already pulled from the kernel.
#[derive(Debug)]
pub struct FdLineReader {
    fd: RawFd,
    pending: Vec<u8>,
}

impl FdLineReader {
    /// The descriptor stays owned by the caller and must outlive the reader.
    pub fn new(fd: RawFd) -> Self {
        Self {
            fd,
            pending: Vec::new(),
        }
    }

    pub fn stdin() -> Self {
        Self::new(libc::STDIN_FILENO)
    }

    /// Next line without its terminator. A final unterminated line is
    /// returned as-is; `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; 1024];
        loop {
            if let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(Some(decode(&line[..pos])));
            }
            let n = read_fd(self.fd, &mut chunk)?;
            if n == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.pending);
                return Ok(Some(decode(&rest)));
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }

    /// True if a read would not block for up to `limit`: buffered bytes are
    /// pending, or the descriptor is readable (data or end of input).
    pub fn wait_input(&self, limit: Duration) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        wait_readable(self.fd, limit)
    }

    /// Drops buffered bytes and, on a terminal, unread kernel input.
    pub fn discard(&mut self) {
        self.pending.clear();
        let rc = unsafe { libc::tcflush(self.fd, libc::TCIFLUSH) };
        if rc != 0 {
            debug!("input not flushed: {}", io::Error::last_os_error());
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn read_fd(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Polls `fd` for input for at most `limit`. End of input counts as readable.
pub fn wait_readable(fd: RawFd, limit: Duration) -> io::Result<bool> {
    let timeout_ms = limit.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if rc >= 0 {
            return Ok(rc > 0);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Console reading from a descriptor (stdin by default) and writing to
/// stdout. Works without a terminal attached: closed input reads as
/// "no answer".
#[derive(Debug, Clone)]
pub struct TerminalConsole {
    reader: Arc<Mutex<FdLineReader>>,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self::with_reader(FdLineReader::stdin())
    }

    pub fn with_reader(reader: FdLineReader) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
        }
    }

    fn prompt(text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

fn lock(reader: &Mutex<FdLineReader>) -> MutexGuard<'_, FdLineReader> {
    reader.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl Console for TerminalConsole {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    async fn read_token(&mut self, prompt: &str) -> io::Result<Option<String>> {
        Self::prompt(prompt)?;
        let reader = Arc::clone(&self.reader);
        blocking(move || {
            let mut reader = lock(&reader);
            while let Some(line) = reader.read_line()? {
                if let Some(token) = first_token(&line) {
                    return Ok(Some(token));
                }
            }
            Ok(None)
        })
        .await
    }

    async fn read_token_within(&mut self, prompt: &str, limit: Duration) -> io::Result<TimedInput> {
        Self::prompt(prompt)?;
        let reader = Arc::clone(&self.reader);
        blocking(move || {
            let mut reader = lock(&reader);
            if !reader.wait_input(limit)? {
                return Ok(TimedInput::TimedOut);
            }
            let line = reader.read_line()?;
            Ok(TimedInput::Ready(line.as_deref().and_then(first_token)))
        })
        .await
    }

    fn discard_pending(&mut self) {
        lock(&self.reader).discard();
    }
}

async fn blocking<T, F>(f: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(io::Error::other)?
}
