//! Container framing properties over the public warc API.

use rs_warcfilter::warc::{self, Truncation, WarcReader, WarcRecordType};
use rs_warcfilter::Error;
use std::io::{Cursor, Read};

fn record(headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"WARC/1.0\r\n");
    for (name, value) in headers {
        out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out.extend_from_slice(b"\r\n\r\n");
    out
}

#[test]
fn captured_length_equals_declared_length() {
    let body = b"0123456789abcdef";
    let data = record(&[("WARC-Type", "response")], body);
    let mut reader = WarcReader::new(Cursor::new(data));

    let Ok(Some(mut rec)) = reader.next_record() else {
        panic!("expected a record");
    };
    let declared = rec.header.content_length;

    let mut read_back = Vec::new();
    if rec.read_to_end(&mut read_back).is_err() {
        panic!("body read failed");
    }
    let captured = match rec.finish() {
        Ok(captured) => captured,
        Err(e) => panic!("finish failed: {e}"),
    };

    assert_eq!(read_back, body);
    assert_eq!(captured, body);
    assert_eq!(captured.len() as u64, declared);
}

#[test]
fn partial_read_captures_only_returned_bytes() {
    let data = record(&[("WARC-Type", "response")], b"abcdefgh");
    let mut reader = WarcReader::new(Cursor::new(data));

    let Ok(Some(mut rec)) = reader.next_record() else {
        panic!("expected a record");
    };
    let mut buf = [0u8; 3];
    match rec.read(&mut buf) {
        Ok(3) => {}
        other => panic!("expected 3 bytes, got {other:?}"),
    }
    assert_eq!(rec.remaining(), 5);

    // The skipped remainder is not captured, and the stream still ends
    // cleanly at the separator.
    let captured = match rec.finish() {
        Ok(captured) => captured,
        Err(e) => panic!("finish failed: {e}"),
    };
    assert_eq!(captured, b"abc");
    assert!(matches!(reader.next_record(), Ok(None)));
}

#[test]
fn mixed_record_types_frame_in_sequence() {
    let mut data = record(&[("WARC-Type", "warcinfo")], b"software: test");
    data.extend_from_slice(&record(
        &[
            ("WARC-Type", "response"),
            ("WARC-Target-URI", "http://example.com/a"),
            ("WARC-Truncated", "time"),
        ],
        b"payload",
    ));
    data.extend_from_slice(&record(&[("WARC-Type", "request")], b"GET / HTTP/1.1"));

    let mut reader = WarcReader::new(Cursor::new(data));
    let mut seen = Vec::new();
    loop {
        match reader.next_record() {
            Ok(Some(rec)) => {
                seen.push((rec.header.record_type, rec.header.truncated));
                if rec.finish().is_err() {
                    panic!("finish failed");
                }
            }
            Ok(None) => break,
            Err(e) => panic!("framing failed: {e}"),
        }
    }
    assert_eq!(
        seen,
        vec![
            (WarcRecordType::Warcinfo, Truncation::Full),
            (WarcRecordType::Response, Truncation::Time),
            (WarcRecordType::Request, Truncation::Full),
        ]
    );
}

#[test]
fn zero_content_length_is_fatal() {
    let data = b"WARC/1.0\r\nWARC-Type: response\r\nContent-Length: 0\r\n\r\n\r\n\r\n".to_vec();
    let mut reader = WarcReader::new(Cursor::new(data));
    match reader.next_record() {
        Err(e @ Error::Framing(_)) => assert!(e.is_fatal()),
        other => panic!("expected fatal framing error, got {other:?}"),
    }
}

#[test]
fn garbage_magic_line_is_fatal() {
    let mut reader = WarcReader::new(Cursor::new(b"HTTP/1.1 200 OK\r\n\r\n".to_vec()));
    assert!(matches!(reader.next_record(), Err(Error::Framing(_))));
}

#[test]
fn corrupt_separator_is_fatal() {
    let mut data = record(&[("WARC-Type", "response")], b"body");
    // Clobber the final separator.
    let len = data.len();
    data[len - 4..].copy_from_slice(b"????");
    let mut reader = WarcReader::new(Cursor::new(data));
    let Ok(Some(rec)) = reader.next_record() else {
        panic!("expected a record");
    };
    match rec.finish() {
        Err(e @ Error::Framing(_)) => assert!(e.is_fatal()),
        other => panic!("expected fatal framing error, got {other:?}"),
    }
}

#[test]
fn emitted_records_round_trip_byte_identically() {
    let body = b"<html><body>stable</body></html>";
    let mut first = Vec::new();
    if warc::write_record(&mut first, "http://example.com/", body).is_err() {
        panic!("write failed");
    }

    // Reframe and re-serialize: the bytes must not change.
    let mut reader = WarcReader::new(Cursor::new(first.clone()));
    let Ok(Some(mut rec)) = reader.next_record() else {
        panic!("expected a record");
    };
    let uri = rec.header.target_uri.clone();
    let mut reread = Vec::new();
    if rec.read_to_end(&mut reread).is_err() {
        panic!("body read failed");
    }
    if rec.finish().is_err() {
        panic!("finish failed");
    }

    let mut second = Vec::new();
    if warc::write_record(&mut second, &uri, &reread).is_err() {
        panic!("write failed");
    }
    assert_eq!(first, second);
}
