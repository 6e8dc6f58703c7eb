//! # rs-warcfilter
//!
//! Batch preprocessing filter for WARC web-crawl corpora.
//!
//! The pipeline reads captured-page records from an archive stream,
//! extracts the HTTP response embedded in each record, resolves the HTML
//! character encoding, and classifies every page as advertisement-tainted
//! or clean using a host blocklist plus structural heuristics on the
//! markup. Clean records are re-emitted into a compacted output
//! container; a summary line is printed for each one.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_warcfilter::{filter_archive, Blocklist};
//!
//! let blocklist = Blocklist::new();
//! let mut summary = Vec::new();
//! let mut compacted = Vec::new();
//!
//! let stats = filter_archive(&b""[..], &blocklist, &mut summary, &mut compacted)?;
//! assert_eq!(stats.records, 0);
//! # Ok::<(), rs_warcfilter::Error>(())
//! ```
//!
//! ## Behavior
//!
//! - **Framing is strict**: a malformed record header or missing record
//!   separator is fatal for the whole run, since the stream position can
//!   no longer be trusted.
//! - **Content problems are local**: a page with an unknown charset, a
//!   non-HTML payload, or an unreadable body is excluded from the output
//!   and processing continues.
//! - **Classification never re-reads**: one forward pass over the token
//!   stream both checks outbound URLs against the blocklist and flags
//!   script/event-handler content, stopping at the first ad trigger.

mod error;

/// Ad-serving host blocklist and hosts-file loading.
pub mod blocklist;

/// Byte-limiting and capturing reader wrappers.
pub mod capture;

/// Streaming HTML classification.
pub mod classify;

/// Character encoding resolution for response bodies.
pub mod encoding;

/// The record-by-record filtering pipeline.
pub mod filter;

/// Embedded HTTP response parsing.
pub mod http;

/// WARC container record framing.
pub mod warc;

// Public API - re-exports
pub use blocklist::Blocklist;
pub use classify::Classification;
pub use encoding::{CharsetSource, EncodingDecision};
pub use error::{Error, Result};
pub use filter::Stats;

use std::io::{BufRead, Write};

/// Filter a WARC stream with a pre-built blocklist.
///
/// Reads records from `input`, writes per-record summary lines to
/// `summary` and the compacted container to `archive`. See
/// [`filter::run`] for the full contract.
pub fn filter_archive<R, S, A>(
    input: R,
    blocklist: &Blocklist,
    summary: S,
    archive: A,
) -> Result<Stats>
where
    R: BufRead,
    S: Write,
    A: Write,
{
    filter::run(input, blocklist, summary, archive)
}
