//! Character encoding resolution for response bodies.
//!
//! Before any content byte is decoded, the pipeline settles on a single
//! [`EncodingDecision`]: a transport-declared charset wins outright; failing
//! that, the first kilobyte of the body is inspected by a byte-signature
//! sniffer and a `<meta>` declaration scan run in parallel; failing both,
//! the decoder falls back to `iso-8859-1`.

use std::fmt;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;

use crate::error::{Error, Result};
use crate::http::{self, ContentTypeInfo};

/// Number of leading body bytes inspected by the look-ahead detections.
pub const LOOKAHEAD_LEN: usize = 1024;

/// The only media type the classifier understands.
pub const HTML_MEDIA_TYPE: &str = "text/html";

/// Fallback charset label when nothing declares or sniffs one.
const DEFAULT_CHARSET: &str = "iso-8859-1";

// Module-level regex patterns for the look-ahead meta scan.
// These are compiled once at first use and reused throughout the program lifetime

/// Match `<meta charset="...">` (also catches the charset parameter inside
/// an `http-equiv` content value, which resolves identically).
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...">`, capturing the
/// full content value for media-type/charset splitting.
#[allow(clippy::expect_used)]
static HTTP_EQUIV_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?([^"'>]+)"#)
        .expect("valid regex")
});

/// Match an HTML doctype, which marks the document as HTML even without
/// any meta declaration.
#[allow(clippy::expect_used)]
static DOCTYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!doctype\s+html").expect("valid regex"));

/// Where a charset decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    /// Transport `Content-Type` header parameter.
    Header,
    /// In-document `<meta>` declaration.
    Meta,
    /// Byte-signature / statistical sniffing.
    Sniffed,
    /// Fallback when nothing else established a charset.
    Default,
}

impl CharsetSource {
    /// Lowercase name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CharsetSource::Header => "header",
            CharsetSource::Meta => "meta",
            CharsetSource::Sniffed => "sniffed",
            CharsetSource::Default => "default",
        }
    }
}

impl fmt::Display for CharsetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved decoding tuple for one record body.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingDecision {
    /// Effective media type, always [`HTML_MEDIA_TYPE`] once resolution
    /// succeeds.
    pub media_type: String,
    /// Charset label as declared or sniffed.
    pub charset: String,
    /// Which detection produced the charset.
    pub source: CharsetSource,
    /// Decoder selected for the label.
    pub encoding: &'static Encoding,
}

/// Tier 1: resolve from the transport `Content-Type` header alone.
///
/// Returns `Ok(Some(_))` when the header declares an HTML media type with a
/// non-empty charset; `Ok(None)` when the look-ahead tiers must run. A
/// declared non-HTML media type fails with
/// [`Error::UnsupportedMediaType`]: the record is not HTML and will never
/// be classified.
pub fn from_header(content_type: Option<&ContentTypeInfo>) -> Result<Option<EncodingDecision>> {
    let Some(info) = content_type else {
        return Ok(None);
    };
    if info.media_type.is_empty() {
        return Ok(None);
    }
    if info.media_type != HTML_MEDIA_TYPE {
        return Err(Error::UnsupportedMediaType(info.media_type.clone()));
    }
    let Some(charset) = info.charset.as_deref() else {
        return Ok(None);
    };
    let Some(encoding) = Encoding::for_label(charset.as_bytes()) else {
        return Err(Error::UnknownCharset {
            charset: charset.to_string(),
            origin: CharsetSource::Header,
        });
    };
    Ok(Some(decision(charset, CharsetSource::Header, encoding)))
}

/// Tier 2 and 3: resolve from the look-ahead window.
///
/// `window` holds the first body bytes (up to [`LOOKAHEAD_LEN`]); the
/// caller replays the same bytes as the head of the streaming decode.
/// `declared` is the transport content type, used only for its media type
/// here; a declared charset was already handled by [`from_header`].
pub fn from_lookahead(
    window: &[u8],
    declared: Option<&ContentTypeInfo>,
) -> Result<EncodingDecision> {
    let head = &window[..window.len().min(LOOKAHEAD_LEN)];
    let head_str = String::from_utf8_lossy(head);
    let meta = scan_meta(&head_str);

    let media_type = match declared {
        Some(info) if !info.media_type.is_empty() => info.media_type.clone(),
        _ => meta.media_type.clone().unwrap_or_default(),
    };
    if media_type != HTML_MEDIA_TYPE {
        return Err(Error::UnsupportedMediaType(media_type));
    }

    let sniffed = sniff(head);

    if let Some((encoding, true)) = sniffed {
        return Ok(decision(encoding.name(), CharsetSource::Sniffed, encoding));
    }
    if let Some(label) = meta.charset {
        return match Encoding::for_label(label.as_bytes()) {
            Some(encoding) => Ok(decision(&label, CharsetSource::Meta, encoding)),
            None => Err(Error::UnknownCharset {
                charset: label,
                origin: CharsetSource::Meta,
            }),
        };
    }
    if let Some((encoding, _)) = sniffed {
        return Ok(decision(encoding.name(), CharsetSource::Sniffed, encoding));
    }

    // iso-8859-1 maps to the windows-1252 decoder per WHATWG; the label is
    // reported as resolved.
    Ok(decision(DEFAULT_CHARSET, CharsetSource::Default, WINDOWS_1252))
}

fn decision(
    charset: &str,
    source: CharsetSource,
    encoding: &'static Encoding,
) -> EncodingDecision {
    EncodingDecision {
        media_type: HTML_MEDIA_TYPE.to_string(),
        charset: charset.to_string(),
        source,
        encoding,
    }
}

/// Byte-signature sniffer. A BOM is a certain result; a window that is
/// valid UTF-8 and contains non-ASCII bytes is an uncertain UTF-8 guess;
/// pure ASCII carries no signal.
fn sniff(head: &[u8]) -> Option<(&'static Encoding, bool)> {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(head) {
        return Some((encoding, true));
    }
    if head.is_ascii() {
        return None;
    }
    if valid_utf8_prefix(head) {
        return Some((UTF_8, false));
    }
    None
}

/// Whether `head` is valid UTF-8, allowing a multi-byte sequence cut off
/// by the window edge.
fn valid_utf8_prefix(head: &[u8]) -> bool {
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}

struct MetaScan {
    charset: Option<String>,
    media_type: Option<String>,
}

/// Scan the lossy-decoded window for meta declarations and a doctype.
fn scan_meta(head: &str) -> MetaScan {
    let mut charset = CHARSET_META_RE
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let mut media_type = None;
    if let Some(content) = HTTP_EQUIV_META_RE.captures(head).and_then(|c| c.get(1)) {
        let info = http::parse_content_type(content.as_str());
        if !info.media_type.is_empty() {
            media_type = Some(info.media_type);
        }
        if charset.is_none() {
            charset = info.charset;
        }
    }
    if media_type.is_none() && (charset.is_some() || DOCTYPE_RE.is_match(head)) {
        media_type = Some(HTML_MEDIA_TYPE.to_string());
    }

    MetaScan {
        charset,
        media_type,
    }
}
