//! Error types for rs-warcfilter.
//!
//! This module defines the error taxonomy of the filtering pipeline. Only
//! container-framing violations and output-stream failures are fatal for a
//! whole run; every content-level problem is scoped to the record that
//! produced it so one malformed page never stops an entire archive.

use crate::encoding::CharsetSource;

/// Error type for archive filtering operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The container stream violated the record framing contract
    /// (bad magic line, malformed header, missing separator). The stream
    /// position can no longer be trusted, so the run must stop.
    #[error("malformed record framing: {0}")]
    Framing(String),

    /// The embedded HTTP response head could not be parsed.
    #[error("malformed HTTP response head: {0}")]
    Response(String),

    /// The declared or sniffed media type is not HTML.
    #[error("unsupported media type {0:?}")]
    UnsupportedMediaType(String),

    /// The resolved charset label has no available decoder.
    #[error("unknown charset {charset:?} (from {origin})")]
    UnknownCharset {
        /// Charset label as it appeared in the header or meta tag.
        charset: String,
        /// Which detection produced the label.
        origin: CharsetSource,
    },

    /// The token scan failed partway through a record body.
    #[error("markup scan failed: {0}")]
    Markup(String),

    /// Writing to the output container or summary stream failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl Error {
    /// Whether this error terminates the whole run.
    ///
    /// Framing violations and output failures are fatal; everything else
    /// excludes a single record and lets processing continue.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Framing(_) | Error::Output(_))
    }
}

/// Result type alias for filtering operations.
pub type Result<T> = std::result::Result<T, Error>;
