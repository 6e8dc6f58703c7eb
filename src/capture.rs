//! Byte-limiting and capturing reader wrappers.
//!
//! A record body is handed to the classifier as a bounded sub-stream of the
//! container input: a [`LimitReader`] caps reads at the record's declared
//! `Content-Length`, and a [`CaptureReader`] tees every byte actually
//! returned into an in-memory buffer so a clean record can be re-emitted
//! verbatim. The two concerns are kept as separate wrappers and composed by
//! the framer.

use std::io::{self, Read};

/// Reader adapter that returns at most a fixed number of bytes.
///
/// Each `read` returns at most `min(requested, remaining)` bytes and
/// decrements the remaining budget. Once the budget is exhausted, reads
/// report end-of-stream even if the underlying source has more data.
#[derive(Debug)]
pub struct LimitReader<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> LimitReader<R> {
    /// Wrap `inner`, allowing at most `limit` bytes to be read through.
    pub fn new(inner: R, limit: u64) -> Self {
        LimitReader {
            inner,
            remaining: limit,
        }
    }

    /// Unread byte budget.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Consume the wrapper and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for LimitReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let cap = usize::try_from(self.remaining.min(buf.len() as u64))
            .unwrap_or(buf.len());
        let n = self.inner.read(&mut buf[..cap])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Reader adapter that records every byte it returns.
///
/// The capture buffer matches the bytes handed to callers byte-for-byte,
/// in order. Reads that bypass the wrapper (e.g. skip-discarding an
/// unread remainder) are deliberately not captured.
#[derive(Debug)]
pub struct CaptureReader<R> {
    inner: R,
    captured: Vec<u8>,
}

impl<R: Read> CaptureReader<R> {
    /// Wrap `inner` with an empty capture buffer.
    pub fn new(inner: R) -> Self {
        CaptureReader {
            inner,
            captured: Vec::new(),
        }
    }

    /// Bytes returned by reads so far.
    #[must_use]
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Shared reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consume the wrapper, returning the underlying reader and the
    /// capture buffer.
    pub fn into_parts(self) -> (R, Vec<u8>) {
        (self.inner, self.captured)
    }
}

impl<R: Read> Read for CaptureReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.captured.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
