//! The archive filtering pipeline.
//!
//! Strictly sequential: each record is fully framed, classified, and
//! (conditionally) emitted before the next record's header line is read.
//! Framing violations abort the run; every content-level problem excludes
//! only the record that produced it.

use std::io::{BufRead, BufReader, Cursor, Read, Write};

use crate::blocklist::Blocklist;
use crate::classify::{self, Classification};
use crate::encoding::{self, LOOKAHEAD_LEN};
use crate::error::{Error, Result};
use crate::http::{self, ResponseHead};
use crate::warc::{self, WarcReader, WarcRecordType};

/// Outcome counters for one filtering run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Records framed, of any type.
    pub records: u64,
    /// `response`-type records seen.
    pub responses: u64,
    /// Clean records re-emitted into the output container.
    pub emitted: u64,
    /// Records classified as ads.
    pub ads: u64,
    /// Records excluded by per-record errors (non-HTML, unknown charset,
    /// malformed response head, failed scan).
    pub skipped: u64,
}

/// Filter a WARC stream.
///
/// Reads records from `input`; for every `response` record that
/// classifies as clean, writes a summary line
/// (`content-length code-flag target-uri truncation`) to `summary` and
/// re-serializes the captured body into `archive`. Per-record diagnostics
/// go to stderr; only framing or output failures end the run early.
pub fn run<R, S, A>(
    input: R,
    blocklist: &Blocklist,
    mut summary: S,
    mut archive: A,
) -> Result<Stats>
where
    R: BufRead,
    S: Write,
    A: Write,
{
    let mut reader = WarcReader::new(input);
    let mut stats = Stats::default();

    while let Some(mut record) = reader.next_record()? {
        stats.records += 1;

        if record.header.record_type != WarcRecordType::Response {
            // Not classified: the body is skip-discarded, never decoded.
            record.finish()?;
            continue;
        }
        stats.responses += 1;

        let outcome = classify_response(&mut record, blocklist);
        let header = record.header.clone();
        match outcome {
            Ok(result) if result.is_ad => {
                stats.ads += 1;
                record.finish()?;
            }
            Ok(result) => {
                writeln!(
                    summary,
                    "{} {} {} {}",
                    header.content_length,
                    result.has_code,
                    header.target_uri,
                    header.truncated.as_str()
                )?;
                let captured = record.finish()?;
                warc::write_record(&mut archive, &header.target_uri, &captured)?;
                stats.emitted += 1;
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                stats.skipped += 1;
                // Media-type mismatches are routine and stay quiet; the
                // rest name the record they excluded.
                if !matches!(e, Error::UnsupportedMediaType(_)) {
                    eprintln!("{}: {e}", header.target_uri);
                }
                record.finish()?;
            }
        }
    }

    Ok(stats)
}

/// Classify one response record body.
///
/// Parses the embedded HTTP head, resolves the character encoding
/// (reading the look-ahead window only when the transport header does not
/// decide), and runs the token scan over the window replayed ahead of the
/// remaining stream.
fn classify_response<R: Read>(body: R, blocklist: &Blocklist) -> Result<Classification> {
    let mut reader = BufReader::new(body);
    let head = ResponseHead::parse(&mut reader)?;
    let declared = head.content_type().map(http::parse_content_type);

    let (decision, window) = match encoding::from_header(declared.as_ref())? {
        Some(decision) => (decision, Vec::new()),
        None => {
            let mut window = Vec::with_capacity(LOOKAHEAD_LEN);
            (&mut reader)
                .take(LOOKAHEAD_LEN as u64)
                .read_to_end(&mut window)
                .map_err(|e| Error::Markup(format!("read error in look-ahead window: {e}")))?;
            let decision = encoding::from_lookahead(&window, declared.as_ref())?;
            (decision, window)
        }
    };

    classify::classify(Cursor::new(window).chain(reader), &decision, blocklist)
}
