//! Streaming HTML classification.
//!
//! A single forward pass over the decoded token stream does two jobs at
//! once: outbound-resource URLs are checked against the host blocklist,
//! and script/event-handler content is flagged. A blocklist hit or a
//! known ad-network script marker stops the scan immediately; the rest of
//! the body is never tokenized.
//!
//! The tokenizer is resilient: malformed markup degrades to "not an ad"
//! rather than failing the record. Only an I/O failure while streaming
//! the body surfaces as an error.

use std::io::Read;

use encoding_rs::{CoderResult, Decoder};
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
    TokenizerResult,
};

use crate::blocklist::Blocklist;
use crate::encoding::EncodingDecision;
use crate::error::{Error, Result};

/// Script text prefix planted by a well-known ad-network loader.
const AD_SCRIPT_MARKER: &str = "var _gaq";

/// Body bytes per read/decode round.
const READ_CHUNK: usize = 4096;

/// Terminal classification outcome for one record.
///
/// `has_code` is informational (script/embed/object or inline handlers
/// present) and does not by itself suppress emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    /// The page references a blocklisted host or carries an ad marker.
    pub is_ad: bool,
    /// The page carries active code.
    pub has_code: bool,
}

/// URL-bearing attribute for a tag, and whether the tag implies active
/// code.
fn url_attribute(tag: &str) -> (Option<&'static str>, bool) {
    match tag {
        "img" => (Some("src"), false),
        "script" | "embed" => (Some("src"), true),
        "object" => (Some("data"), true),
        "iframe" | "video" | "audio" | "source" | "track" => (Some("src"), false),
        "link" => (Some("href"), false),
        _ => (None, false),
    }
}

struct ClassifySink<'a> {
    blocklist: &'a Blocklist,
    is_ad: bool,
    has_code: bool,
    /// Set between a `<script>` start tag and the token that follows it.
    in_script: bool,
}

impl ClassifySink<'_> {
    fn process_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        self.in_script = false;
        if tag.kind != TagKind::StartTag {
            return TokenSinkResult::Continue;
        }

        let name: &str = &tag.name;
        let (url_attr, tag_has_code) = url_attribute(name);
        if tag_has_code {
            self.has_code = true;
        }

        for attr in &tag.attrs {
            let key: &str = &attr.name.local;
            if url_attr == Some(key) {
                if self.blocklist.matches_url(&attr.value) {
                    self.is_ad = true;
                    return TokenSinkResult::Script(());
                }
            } else if key == "class" || key == "id" {
                // Explicitly ignored: styling hooks, not resources.
            } else if key.starts_with("on") {
                self.has_code = true;
            }
        }

        // Raw-content elements switch the tokenizer state so their
        // contents cannot fake tags. Script text additionally feeds the
        // marker check on the next token.
        match name {
            "script" if !tag.self_closing => {
                self.in_script = true;
                TokenSinkResult::RawData(RawKind::ScriptData)
            }
            "style" | "xmp" | "noframes" => TokenSinkResult::RawData(RawKind::Rawtext),
            "title" | "textarea" => TokenSinkResult::RawData(RawKind::Rcdata),
            _ => TokenSinkResult::Continue,
        }
    }
}

impl TokenSink for ClassifySink<'_> {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => self.process_tag(&tag),
            Token::CharacterTokens(text) => {
                if std::mem::take(&mut self.in_script)
                    && text.trim_start().starts_with(AD_SCRIPT_MARKER)
                {
                    self.is_ad = true;
                    return TokenSinkResult::Script(());
                }
                TokenSinkResult::Continue
            }
            // Recoverable tokenizer complaints are not part of the token
            // stream proper; malformed markup stays non-fatal.
            Token::ParseError(_) => TokenSinkResult::Continue,
            _ => {
                self.in_script = false;
                TokenSinkResult::Continue
            }
        }
    }
}

/// Run the single-pass scan over a record body.
///
/// `body` yields the entity bytes (the look-ahead window replayed first,
/// then the rest of the stream); they are decoded incrementally with the
/// resolved decoder and fed to the tokenizer until an ad trigger fires or
/// the stream ends.
pub fn classify<R: Read>(
    mut body: R,
    decision: &EncodingDecision,
    blocklist: &Blocklist,
) -> Result<Classification> {
    let mut decoder = decision.encoding.new_decoder_with_bom_removal();
    let mut tokenizer = Tokenizer::new(
        ClassifySink {
            blocklist,
            is_ad: false,
            has_code: false,
            in_script: false,
        },
        TokenizerOpts::default(),
    );
    let mut queue = BufferQueue::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = read_chunk(&mut body, &mut chunk)
            .map_err(|e| Error::Markup(format!("read error in record body: {e}")))?;
        let last = n == 0;

        let decoded = decode_chunk(&mut decoder, &chunk[..n], last);
        if !decoded.is_empty() {
            queue.push_back(StrTendril::from(decoded.as_str()));
            if matches!(tokenizer.feed(&mut queue), TokenizerResult::Script(())) {
                // Short-circuit: an ad trigger fired, leave the rest of
                // the body untokenized.
                break;
            }
        }
        if last {
            tokenizer.end();
            break;
        }
    }

    let sink = tokenizer.sink;
    Ok(Classification {
        is_ad: sink.is_ad,
        has_code: sink.has_code,
    })
}

/// Decode one input chunk, replacing malformed sequences.
fn decode_chunk(decoder: &mut Decoder, input: &[u8], last: bool) -> String {
    let worst_case = decoder
        .max_utf8_buffer_length(input.len())
        .unwrap_or(input.len() * 3 + 16);
    let mut out = String::with_capacity(worst_case);
    let mut consumed = 0;
    loop {
        let (result, read, _had_errors) =
            decoder.decode_to_string(&input[consumed..], &mut out, last);
        consumed += read;
        match result {
            CoderResult::InputEmpty => break,
            CoderResult::OutputFull => out.reserve(READ_CHUNK),
        }
    }
    out
}

fn read_chunk<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    loop {
        match r.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}
