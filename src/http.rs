//! Embedded HTTP response parsing.
//!
//! A `response`-type record body carries a standard HTTP response. Only
//! the head matters to classification: the status line and the header
//! block up to the first blank line. Headers are kept as an ordered
//! multimap with case-insensitive lookup; the entity body stays on the
//! stream for the encoding resolver and classifier.

use std::io::BufRead;

use crate::error::{Error, Result};

/// Status line and headers of an embedded HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// Raw status line, e.g. `HTTP/1.1 200 OK`.
    pub status_line: String,
    headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Parse the response head from the leading bytes of a record body.
    ///
    /// Consumes the stream through the blank line that ends the header
    /// block; the entity body is left unread. Line terminators may be
    /// CRLF or bare LF (captured responses are not always strict).
    pub fn parse<R: BufRead>(r: &mut R) -> Result<Self> {
        let status_line = read_head_line(r)?
            .ok_or_else(|| Error::Response("empty record body".to_string()))?;
        if !status_line.starts_with("HTTP/") {
            return Err(Error::Response(format!(
                "expected HTTP status line, got {status_line:?}"
            )));
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        loop {
            let Some(line) = read_head_line(r)? else {
                return Err(Error::Response(
                    "unexpected end of body inside response head".to_string(),
                ));
            };
            if line.is_empty() {
                break;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                // Folded continuation of the previous header value.
                if let Some(last) = headers.last_mut() {
                    last.1.push(' ');
                    last.1.push_str(line.trim());
                }
                continue;
            }
            match line.split_once(':') {
                Some((name, value)) => {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
                None => {
                    // Valueless garbage line; preserve it as a continuation
                    // rather than failing the whole record.
                    if let Some(last) = headers.last_mut() {
                        last.1.push(' ');
                        last.1.push_str(line.trim());
                    }
                }
            }
        }

        Ok(ResponseHead {
            status_line,
            headers,
        })
    }

    /// First value for a header name (case-insensitive), if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Type` header value, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// HTTP status code parsed out of the status line.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status_line
            .split(' ')
            .nth(1)
            .and_then(|code| code.parse::<u16>().ok())
    }

    /// Number of parsed header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the header block was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

/// `Content-Type` value split into media type and optional charset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeInfo {
    /// Lowercased media type, e.g. `text/html`. Empty if the value was
    /// blank.
    pub media_type: String,
    /// `charset` parameter, dequoted; `None` if absent or empty.
    pub charset: Option<String>,
}

/// Split a `Content-Type` header value on `;`, extracting the media type
/// and a dequoted `charset` parameter.
#[must_use]
pub fn parse_content_type(value: &str) -> ContentTypeInfo {
    let mut parts = value.split(';');
    let media_type = parts
        .next()
        .map(|s| s.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let mut charset = None;
    for param in parts {
        let Some((name, val)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("charset") {
            continue;
        }
        let val = dequote(val.trim());
        if !val.is_empty() {
            charset = Some(val.to_string());
            break;
        }
    }

    ContentTypeInfo {
        media_type,
        charset,
    }
}

fn dequote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Read one head line without its terminator; `None` at end of stream.
fn read_head_line<R: BufRead>(r: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let n = r
        .read_until(b'\n', &mut buf)
        .map_err(|e| Error::Response(format!("read error in response head: {e}")))?;
    if n == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn parse_head(raw: &[u8]) -> ResponseHead {
        let mut reader = BufReader::new(Cursor::new(raw.to_vec()));
        match ResponseHead::parse(&mut reader) {
            Ok(head) => head,
            Err(e) => panic!("head parse failed: {e}"),
        }
    }

    #[test]
    fn parses_status_line_and_headers() {
        let head = parse_head(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nServer: test\r\n\r\nbody",
        );
        assert_eq!(head.status_line, "HTTP/1.1 200 OK");
        assert_eq!(head.status_code(), Some(200));
        assert_eq!(head.content_type(), Some("text/html"));
        assert_eq!(head.header("server"), Some("test"));
        assert_eq!(head.len(), 2);
    }

    #[test]
    fn leaves_entity_body_on_stream() {
        let mut reader = BufReader::new(Cursor::new(
            b"HTTP/1.1 200 OK\r\n\r\n<html>".to_vec(),
        ));
        let head = match ResponseHead::parse(&mut reader) {
            Ok(head) => head,
            Err(e) => panic!("head parse failed: {e}"),
        };
        assert!(head.is_empty());

        let mut rest = Vec::new();
        if std::io::Read::read_to_end(&mut reader, &mut rest).is_err() {
            panic!("body read failed");
        }
        assert_eq!(rest, b"<html>");
    }

    #[test]
    fn first_value_wins_for_duplicates() {
        let head = parse_head(
            b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n",
        );
        assert_eq!(head.header("Set-Cookie"), Some("a=1"));
    }

    #[test]
    fn tolerates_bare_lf_lines() {
        let head = parse_head(b"HTTP/1.0 404 Not Found\nContent-Type: text/html\n\n");
        assert_eq!(head.status_code(), Some(404));
        assert_eq!(head.content_type(), Some("text/html"));
    }

    #[test]
    fn folds_continuation_lines() {
        let head = parse_head(b"HTTP/1.1 200 OK\r\nX-Long: first\r\n second\r\n\r\n");
        assert_eq!(head.header("X-Long"), Some("first second"));
    }

    #[test]
    fn rejects_missing_status_line() {
        let mut reader = BufReader::new(Cursor::new(b"Content-Type: text/html\r\n\r\n".to_vec()));
        assert!(matches!(
            ResponseHead::parse(&mut reader),
            Err(Error::Response(_))
        ));
    }

    #[test]
    fn rejects_unterminated_head() {
        let mut reader = BufReader::new(Cursor::new(b"HTTP/1.1 200 OK\r\nA: b\r\n".to_vec()));
        assert!(matches!(
            ResponseHead::parse(&mut reader),
            Err(Error::Response(_))
        ));
    }

    #[test]
    fn content_type_plain() {
        let info = parse_content_type("text/html");
        assert_eq!(info.media_type, "text/html");
        assert_eq!(info.charset, None);
    }

    #[test]
    fn content_type_with_charset() {
        let info = parse_content_type("text/html; charset=UTF-8");
        assert_eq!(info.media_type, "text/html");
        assert_eq!(info.charset.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn content_type_quoted_charset() {
        let info = parse_content_type("text/html; charset=\"windows-1251\"");
        assert_eq!(info.charset.as_deref(), Some("windows-1251"));
    }

    #[test]
    fn content_type_case_and_order() {
        let info = parse_content_type("Text/HTML; boundary=x; CHARSET=latin1");
        assert_eq!(info.media_type, "text/html");
        assert_eq!(info.charset.as_deref(), Some("latin1"));
    }

    #[test]
    fn content_type_empty_charset_ignored() {
        let info = parse_content_type("text/html; charset=");
        assert_eq!(info.charset, None);
    }
}
