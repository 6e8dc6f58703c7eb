//! WARC container record framing.
//!
//! [`WarcReader`] reads one record at a time from a byte stream: the
//! `WARC/1.0` version line, CRLF-terminated `Name: Value` headers up to a
//! blank line, exactly `Content-Length` body bytes, then the `\r\n\r\n`
//! record separator. The reader owns the stream position; it never looks
//! past the current record boundary and buffers nothing beyond it.
//!
//! Framing violations are unrecoverable for the whole run: the input is an
//! offline batch stream, and once the position discipline is broken no
//! later byte offset can be trusted.

use std::io::{self, BufRead, Read, Write};

use crate::capture::{CaptureReader, LimitReader};
use crate::error::{Error, Result};

/// Record version line, without line terminator.
pub const VERSION_LINE: &str = "WARC/1.0";

/// Four-byte record separator following every record body.
pub const SEPARATOR: &[u8; 4] = b"\r\n\r\n";

/// WARC record type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarcRecordType {
    Warcinfo,
    Response,
    Resource,
    Request,
    Metadata,
    Revisit,
    Conversion,
    Continuation,
    /// Anything not in the standard vocabulary.
    Unknown,
}

impl WarcRecordType {
    /// Parse a `WARC-Type` header value (case-insensitive).
    /// Unrecognized values map to [`WarcRecordType::Unknown`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "warcinfo" => WarcRecordType::Warcinfo,
            "response" => WarcRecordType::Response,
            "resource" => WarcRecordType::Resource,
            "request" => WarcRecordType::Request,
            "metadata" => WarcRecordType::Metadata,
            "revisit" => WarcRecordType::Revisit,
            "conversion" => WarcRecordType::Conversion,
            "continuation" => WarcRecordType::Continuation,
            _ => WarcRecordType::Unknown,
        }
    }

    /// Canonical lowercase header value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            WarcRecordType::Warcinfo => "warcinfo",
            WarcRecordType::Response => "response",
            WarcRecordType::Resource => "resource",
            WarcRecordType::Request => "request",
            WarcRecordType::Metadata => "metadata",
            WarcRecordType::Revisit => "revisit",
            WarcRecordType::Conversion => "conversion",
            WarcRecordType::Continuation => "continuation",
            WarcRecordType::Unknown => "unknown",
        }
    }
}

/// Why a record's captured content was cut short, per `WARC-Truncated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Truncation {
    /// Header absent: the capture is complete.
    #[default]
    Full,
    /// Cut at a length limit.
    Length,
    /// Cut at a time limit.
    Time,
    /// Truncated for an unspecified (or unrecognized) reason.
    Unspecified,
}

impl Truncation {
    /// Parse a `WARC-Truncated` header value.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "length" => Truncation::Length,
            "time" => Truncation::Time,
            _ => Truncation::Unspecified,
        }
    }

    /// Value for the per-record summary line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Truncation::Full => "full",
            Truncation::Length => "length",
            Truncation::Time => "time",
            Truncation::Unspecified => "unspecified",
        }
    }
}

/// Parsed header block of one container record.
#[derive(Debug, Clone)]
pub struct RecordHeader {
    /// `WARC-Type` value; only [`WarcRecordType::Response`] is classified.
    pub record_type: WarcRecordType,
    /// Declared body length in bytes. Always `> 0`.
    pub content_length: u64,
    /// `WARC-Target-URI` value, empty if the header was absent.
    pub target_uri: String,
    /// `WARC-Truncated` value, [`Truncation::Full`] if absent.
    pub truncated: Truncation,
}

/// One framed record: parsed headers plus its bounded, capturing body
/// sub-stream.
///
/// The record borrows the underlying reader, so it must be finished (or
/// dropped via [`Record::finish`]) before the next record can be read.
#[derive(Debug)]
pub struct Record<'a, R: BufRead> {
    /// Parsed record headers.
    pub header: RecordHeader,
    body: CaptureReader<LimitReader<&'a mut R>>,
}

impl<R: BufRead> Record<'_, R> {
    /// Body bytes returned to readers so far.
    #[must_use]
    pub fn captured(&self) -> &[u8] {
        self.body.captured()
    }

    /// Unread portion of the declared body length.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.body.get_ref().remaining()
    }

    /// Skip-discard the unread body remainder, verify the record
    /// separator, and return the capture buffer.
    ///
    /// The discarded remainder bypasses the capture buffer, so the
    /// returned bytes are exactly those handed out by earlier reads.
    pub fn finish(self) -> Result<Vec<u8>> {
        let (mut limit, captured) = self.body.into_parts();
        io::copy(&mut limit, &mut io::sink())
            .map_err(|e| Error::Framing(format!("failed to skip record body: {e}")))?;
        if limit.remaining() > 0 {
            return Err(Error::Framing(
                "unexpected end of stream inside record body".to_string(),
            ));
        }

        let input = limit.into_inner();
        let mut sep = [0u8; 4];
        input
            .read_exact(&mut sep)
            .map_err(|e| Error::Framing(format!("missing record separator: {e}")))?;
        if &sep != SEPARATOR {
            return Err(Error::Framing(format!(
                "expected record separator \"\\r\\n\\r\\n\", got {:?}",
                String::from_utf8_lossy(&sep)
            )));
        }
        Ok(captured)
    }
}

impl<R: BufRead> Read for Record<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.body.read(buf)
    }
}

/// Streaming reader over a WARC container.
pub struct WarcReader<R> {
    input: R,
}

impl<R: BufRead> WarcReader<R> {
    /// Wrap a buffered input stream positioned at a record boundary.
    pub fn new(input: R) -> Self {
        WarcReader { input }
    }

    /// Frame the next record, or return `Ok(None)` at clean end-of-stream.
    ///
    /// The caller must exhaust or [`Record::finish`] the returned record
    /// before calling `next_record` again; the borrow checker enforces
    /// this.
    pub fn next_record(&mut self) -> Result<Option<Record<'_, R>>> {
        let buffered = self
            .input
            .fill_buf()
            .map_err(|e| Error::Framing(format!("read error at record boundary: {e}")))?;
        if buffered.is_empty() {
            return Ok(None);
        }

        let line = read_crlf_line(&mut self.input)?;
        if line != VERSION_LINE.as_bytes() {
            return Err(Error::Framing(format!(
                "expected {VERSION_LINE} version line, got {:?}",
                String::from_utf8_lossy(&line)
            )));
        }

        let mut record_type = WarcRecordType::Unknown;
        let mut content_length: Option<u64> = None;
        let mut target_uri = String::new();
        let mut truncated = Truncation::Full;

        loop {
            let line = read_crlf_line(&mut self.input)?;
            if line.is_empty() {
                break;
            }
            let line = String::from_utf8_lossy(&line);
            let Some((name, value)) = line.split_once(": ") else {
                return Err(Error::Framing(format!("malformed header line {line:?}")));
            };
            match name {
                "WARC-Type" => record_type = WarcRecordType::from_label(value),
                "Content-Length" => {
                    let parsed = value.trim().parse::<u64>().map_err(|_| {
                        Error::Framing(format!(
                            "Content-Length: expected decimal integer, got {value:?}"
                        ))
                    })?;
                    content_length = Some(parsed);
                }
                "WARC-Target-URI" => target_uri = value.to_string(),
                "WARC-Truncated" => truncated = Truncation::from_label(value),
                _ => {}
            }
        }

        let content_length = match content_length {
            Some(n) if n > 0 => n,
            Some(_) => {
                return Err(Error::Framing("expected Content-Length > 0".to_string()));
            }
            None => {
                return Err(Error::Framing("missing Content-Length header".to_string()));
            }
        };

        let body = CaptureReader::new(LimitReader::new(&mut self.input, content_length));
        Ok(Some(Record {
            header: RecordHeader {
                record_type,
                content_length,
                target_uri,
                truncated,
            },
            body,
        }))
    }
}

/// Serialize a trimmed `response` record into an output container.
///
/// The header set is fixed (`WARC-Type`, `Content-Length`,
/// `WARC-Target-URI`) and `Content-Length` is recomputed from the body
/// slice, so emitted records re-frame cleanly.
pub fn write_record<W: Write>(w: &mut W, target_uri: &str, body: &[u8]) -> io::Result<()> {
    write!(w, "{VERSION_LINE}\r\n")?;
    write!(w, "WARC-Type: response\r\n")?;
    write!(w, "Content-Length: {}\r\n", body.len())?;
    write!(w, "WARC-Target-URI: {target_uri}\r\n")?;
    write!(w, "\r\n")?;
    w.write_all(body)?;
    w.write_all(SEPARATOR)
}

/// Read one strict CRLF-terminated line, returning it without the
/// terminator. A CR not followed by LF is a framing violation.
fn read_crlf_line<R: BufRead>(r: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    r.read_until(b'\r', &mut line)
        .map_err(|e| Error::Framing(format!("read error in header line: {e}")))?;
    if line.last() != Some(&b'\r') {
        return Err(Error::Framing(
            "unexpected end of stream in header line".to_string(),
        ));
    }
    line.pop();

    let mut lf = [0u8; 1];
    r.read_exact(&mut lf)
        .map_err(|e| Error::Framing(format!("read error in header line: {e}")))?;
    if lf[0] != b'\n' {
        return Err(Error::Framing(format!(
            "expected LF after CR, got {:?}",
            char::from(lf[0])
        )));
    }
    Ok(line)
}
