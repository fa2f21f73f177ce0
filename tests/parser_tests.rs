use std::io::{self, Cursor, Read};

use wirefold::{
    BodySink, BodyStorage, DefaultHeaderFactory, Header, HeaderKind, MemoryStorage, Method, ParseError,
    ParseStatus, ParserConfig, ProtocolVersion, RequestBuffer, TempFileStorage, format_debug,
    format_headers_only, format_json, parse_chunks, parse_reader, parse_request,
    parse_request_with_config,
};

// =========================================================================
// Start-line parsing
// =========================================================================

#[test]
fn simple_get_request() {
    let raw = b"GET /hello HTTP/1.1\nHost: innmind.com\n\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.target, "/hello");
    assert_eq!(req.version, ProtocolVersion::Http11);
    assert_eq!(req.headers.len(), 1);
    assert_eq!(req.header_value("Host"), Some("innmind.com"));
    assert!(req.body.is_none());
}

#[test]
fn get_with_query_string() {
    let raw = b"GET /api/users?page=1&limit=10 HTTP/1.1\r\nAccept: application/json\r\n\r\n";
    let req = parse_request(raw).expect("should parse");
    assert_eq!(req.target.path(), "/api/users");
    assert_eq!(req.target.query(), Some("page=1&limit=10"));
    assert_eq!(req.header_value("Accept"), Some("application/json"));
}

#[test]
fn http_10_version() {
    let req = parse_request(b"GET /legacy HTTP/1.0\r\n\r\n").expect("should parse");
    assert_eq!(req.version, ProtocolVersion::Http10);
}

#[test]
fn all_known_methods() {
    let methods = [
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("CONNECT", Method::CONNECT),
        ("OPTIONS", Method::OPTIONS),
        ("TRACE", Method::TRACE),
        ("PATCH", Method::PATCH),
        ("LINK", Method::LINK),
        ("UNLINK", Method::UNLINK),
    ];

    for (name, expected) in methods {
        // Content-Length: 0 keeps body-capable methods from waiting for a body.
        let raw = format!("{name} / HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        let req = parse_request(raw.as_bytes()).unwrap_or_else(|e| panic!("method {name}: {e}"));
        assert_eq!(req.method, expected, "mismatch for method {name}");
    }
}

#[test]
fn options_asterisk_target() {
    let req = parse_request(b"OPTIONS * HTTP/1.1\r\n\r\n").expect("should parse");
    assert_eq!(req.target, "*");
}

// =========================================================================
// Header parsing
// =========================================================================

#[test]
fn headers_keep_arrival_order() {
    let raw = b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n";
    let req = parse_request(raw).unwrap();
    let names: Vec<&str> = req.headers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn case_insensitive_header_lookup() {
    let req = parse_request(b"GET / HTTP/1.1\nContent-Type: text/html\n\n").unwrap();
    assert_eq!(req.header_value("content-type"), Some("text/html"));
    assert_eq!(req.header_value("CONTENT-TYPE"), Some("text/html"));
}

#[test]
fn duplicate_header_values() {
    let raw = b"GET / HTTP/1.1\nAccept: text/html\nAccept: application/json\n\n";
    let req = parse_request(raw).unwrap();
    assert_eq!(req.header_values("Accept"), ["text/html", "application/json"]);
}

#[test]
fn header_value_is_taken_verbatim() {
    let req = parse_request(b"GET / HTTP/1.1\nX-Pad:   spaced  \n\n").unwrap();
    assert_eq!(req.header_value("X-Pad"), Some("  spaced  "));
}

#[test]
fn repeated_carriage_returns_are_trimmed() {
    let req = parse_request(b"GET / HTTP/1.1\r\nHost: h\r\r\nX-A: 1\r\n\r\r\n").unwrap();
    assert_eq!(req.header_value("Host"), Some("h"));
    assert_eq!(req.headers.host(), Some(("h", None)));
    assert_eq!(req.header_value("X-A"), Some("1"));
}

#[test]
fn non_utf8_header_bytes_are_replaced() {
    let req = parse_request(b"GET / HTTP/1.1\nX-Name: caf\xe9\n\n").unwrap();
    assert_eq!(req.header_value("X-Name"), Some("caf\u{FFFD}"));
}

#[test]
fn typed_headers_from_default_factory() {
    let raw = b"GET / HTTP/1.1\nHost: innmind.com:8080\nCookie: a=1; b=2\n\n";
    let req = parse_request(raw).unwrap();
    assert_eq!(req.headers.host(), Some(("innmind.com", Some(8080))));
    assert_eq!(
        req.headers.get("cookie").unwrap().kind,
        HeaderKind::Cookie(vec![("a".into(), "1".into()), ("b".into(), "2".into())])
    );
}

#[test]
fn rejecting_factory_fails_the_parse() {
    let no_cookies = |name: &str, value: &str| -> Option<Header> {
        (!name.eq_ignore_ascii_case("cookie")).then(|| Header::raw(name, value))
    };
    let mut buffer = RequestBuffer::with_parts(ParserConfig::default(), no_cookies, MemoryStorage);
    let err = buffer.feed(b"GET / HTTP/1.1\nCookie: a=1\n\n").unwrap_err();
    assert_eq!(err, ParseError::HeaderRejected("Cookie".into()));
}

// =========================================================================
// Body handling
// =========================================================================

#[test]
fn post_with_content_length_body() {
    let req = parse_request(b"POST /f HTTP/1.1\nContent-Length: 4\n\nabcd").unwrap();
    assert_eq!(req.content_length(), Some(4));
    assert_eq!(req.body_as_str(), Some("abcd"));
}

#[test]
fn bytes_past_content_length_are_ignored() {
    let req = parse_request(b"POST /f HTTP/1.1\r\nContent-Length: 4\r\n\r\nabcd\r\n\r\nGET / HTTP/1.1\r\n\r\n")
        .unwrap();
    assert_eq!(req.body_as_str(), Some("abcd"));
}

#[test]
fn content_length_zero_yields_no_body() {
    let req = parse_request(b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n").unwrap();
    assert!(req.body.is_none());
}

#[test]
fn content_length_zero_with_trailing_bytes_yields_empty_body() {
    let req = parse_request(b"POST / HTTP/1.1\nContent-Length: 0\n\nleftover").unwrap();
    assert_eq!(req.body_as_str(), Some(""));
}

#[test]
fn sentinel_terminated_body() {
    let req = parse_request(b"POST /f HTTP/1.1\n\nabc\n\n").unwrap();
    assert_eq!(req.body_as_str(), Some("abc"));
}

#[test]
fn sentinel_terminated_body_crlf() {
    let req = parse_request(b"POST /f HTTP/1.1\r\n\r\nline one\r\nline two\r\n\r\n").unwrap();
    assert_eq!(req.body_as_str(), Some("line one\r\nline two"));
}

#[test]
fn get_with_trailing_bytes_reads_a_body() {
    let req = parse_request(b"GET / HTTP/1.1\n\nping\n\n").unwrap();
    assert_eq!(req.body_as_str(), Some("ping"));
}

#[test]
fn unparsable_content_length_falls_back_to_sentinel() {
    for value in ["-4", "four", "4 "] {
        let raw = format!("POST / HTTP/1.1\nContent-Length: {value}\n\nabcdef\n\n");
        let req = parse_request(raw.as_bytes()).unwrap_or_else(|e| panic!("{value}: {e}"));
        assert_eq!(req.content_length(), None);
        assert_eq!(req.body_as_str(), Some("abcdef"), "value {value:?}");
    }
}

#[test]
fn first_content_length_wins() {
    let raw = b"POST / HTTP/1.1\nContent-Length: 2\nContent-Length: 4\n\nabcd";
    let req = parse_request(raw).unwrap();
    assert_eq!(req.body_as_str(), Some("ab"));
}

// =========================================================================
// Incremental (streaming) parsing
// =========================================================================

#[test]
fn split_post_matches_single_chunk() {
    let chunks = ["POST /f HTT", "P/1.1\nConte", "nt-Length: 4\n\nab", "cd"];
    let split = parse_chunks(chunks).unwrap();
    let whole = parse_request(chunks.concat().as_bytes()).unwrap();
    assert_eq!(split, whole);
    assert_eq!(split.body_as_str(), Some("abcd"));
}

#[test]
fn incremental_byte_by_byte() {
    let raw = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let mut buffer = RequestBuffer::new();

    for &byte in &raw[..raw.len() - 1] {
        let status = buffer.feed(&[byte]).expect("each byte should be ok");
        assert_eq!(status, ParseStatus::Incomplete);
    }
    assert_eq!(buffer.feed(&raw[raw.len() - 1..]).unwrap(), ParseStatus::Complete);

    let req = buffer.finish().expect("should finish");
    assert_eq!(req.method, Method::GET);
    assert_eq!(req.header_value("Host"), Some("example.com"));
}

#[test]
fn sentinel_straddling_chunks() {
    let req = parse_chunks(["POST /f HTTP/1.1\r\n\r\nsome[key]=value\r\n", "\r\n"]).unwrap();
    assert_eq!(req.body_as_str(), Some("some[key]=value"));
}

#[test]
fn cr_tolerance() {
    let lf = parse_request(b"PUT /x HTTP/1.0\nA: 1\nB: 2\nContent-Length: 3\n\nxyz").unwrap();
    let crlf =
        parse_request(b"PUT /x HTTP/1.0\r\nA: 1\r\nB: 2\r\nContent-Length: 3\r\n\r\nxyz").unwrap();
    assert_eq!(lf, crlf);
}

#[test]
fn parse_reader_pulls_in_chunks() {
    let raw = b"POST /upload HTTP/1.1\nContent-Length: 11\n\nhello world".to_vec();
    for chunk_size in [1, 3, 7, 64] {
        let req = parse_reader(Cursor::new(raw.clone()), chunk_size).unwrap();
        assert_eq!(req.body_as_str(), Some("hello world"), "chunk size {chunk_size}");
    }
}

// =========================================================================
// Truncation & errors
// =========================================================================

#[test]
fn truncated_headers_yield_no_request() {
    let result = parse_chunks(["GET / HTTP/1.1\n", "Host: inn"]);
    assert_eq!(result.unwrap_err(), ParseError::IncompleteRequest);
    assert!(parse_chunks(["GET / HTTP/1.1\n"]).ok().is_none());
}

#[test]
fn truncated_bounded_body_yields_no_request() {
    let result = parse_request(b"POST / HTTP/1.1\nContent-Length: 10\n\nshort");
    assert_eq!(result.unwrap_err(), ParseError::IncompleteRequest);
}

#[test]
fn unterminated_sentinel_body_yields_no_request() {
    let result = parse_request(b"POST / HTTP/1.1\n\nabc\n");
    assert_eq!(result.unwrap_err(), ParseError::IncompleteRequest);
}

#[test]
fn empty_input_yields_no_request() {
    assert_eq!(parse_request(b"").unwrap_err(), ParseError::IncompleteRequest);
}

#[test]
fn error_lowercase_method() {
    let err = parse_request(b"get / HTTP/1.1\n\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedStartLine(_)));
}

#[test]
fn error_unknown_method() {
    let err = parse_request(b"BREW /pot HTTP/1.1\n\n").unwrap_err();
    assert_eq!(err, ParseError::InvalidMethod("BREW".into()));
}

#[test]
fn error_invalid_version() {
    for line in ["GET / HTTP/1.2", "GET / HTTP/1", "GET / HTTP/2.0"] {
        let err = parse_request(format!("{line}\n\n").as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidVersion(_)), "{line}: {err}");
    }
}

#[test]
fn error_missing_version() {
    let err = parse_request(b"GET /\n\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedStartLine(_)));
}

#[test]
fn error_invalid_target() {
    let err = parse_request(b"GET /caf\xc3\xa9 HTTP/1.1\n\n").unwrap_err();
    assert!(matches!(err, ParseError::InvalidTarget(_)));
}

#[test]
fn error_target_with_space() {
    let err = parse_request(b"GET /a b HTTP/1.1\n\n").unwrap_err();
    assert_eq!(err, ParseError::InvalidTarget("/a b".into()));
}

#[test]
fn error_malformed_header() {
    let err = parse_request(b"GET / HTTP/1.1\nHost:innmind.com\n\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedHeader(_)));
}

#[test]
fn failed_buffer_ignores_further_input() {
    let buffer = RequestBuffer::new()
        .supply(b"NOT A REQUEST\n")
        .supply(b"GET / HTTP/1.1\n\n");
    assert!(buffer.is_failed());
    assert!(matches!(buffer.finish(), Err(ParseError::MalformedStartLine(_))));
}

#[test]
fn error_display_messages() {
    assert_eq!(
        ParseError::InvalidMethod("BREW".into()).to_string(),
        "invalid HTTP method: 'BREW'"
    );
    assert_eq!(ParseError::IncompleteRequest.to_string(), "incomplete HTTP request");
}

// =========================================================================
// Configuration limits
// =========================================================================

#[test]
fn config_max_body_size_enforced_for_declared_length() {
    let config = ParserConfig {
        max_body_size: 10,
        ..ParserConfig::default()
    };
    let raw = b"POST / HTTP/1.1\nContent-Length: 20\n\n01234567890123456789";
    assert_eq!(
        parse_request_with_config(raw, config).unwrap_err(),
        ParseError::BodyTooLarge
    );
}

#[test]
fn config_max_body_size_enforced_for_sentinel_body() {
    let config = ParserConfig {
        max_body_size: 4,
        ..ParserConfig::default()
    };
    let mut buffer = RequestBuffer::with_config(config);
    assert_eq!(buffer.feed(b"POST / HTTP/1.1\n\nabc").unwrap(), ParseStatus::Incomplete);
    assert_eq!(buffer.feed(b"de").unwrap_err(), ParseError::BodyTooLarge);
}

#[test]
fn config_max_headers_count_enforced() {
    let config = ParserConfig {
        max_headers_count: 2,
        ..ParserConfig::default()
    };
    let raw = b"GET / HTTP/1.1\nA: 1\nB: 2\nC: 3\n\n";
    assert_eq!(
        parse_request_with_config(raw, config).unwrap_err(),
        ParseError::TooManyHeaders
    );
}

#[test]
fn config_max_start_line_enforced_before_terminator() {
    let config = ParserConfig {
        max_start_line_len: 16,
        ..ParserConfig::default()
    };
    let mut buffer = RequestBuffer::with_config(config);
    let err = buffer.feed(b"GET /a/very/long/path/indeed").unwrap_err();
    assert_eq!(err, ParseError::StartLineTooLong);
}

#[test]
fn config_max_header_line_enforced() {
    let config = ParserConfig {
        max_header_line_len: 8,
        ..ParserConfig::default()
    };
    let raw = b"GET / HTTP/1.1\nX-Long: abcdefgh\n\n";
    assert_eq!(
        parse_request_with_config(raw, config).unwrap_err(),
        ParseError::HeaderTooLarge
    );
}

// =========================================================================
// Body storage
// =========================================================================

#[test]
fn temp_file_storage_spools_body() {
    let dir = tempfile::tempdir().unwrap();
    let buffer = RequestBuffer::with_parts(
        ParserConfig::default(),
        DefaultHeaderFactory,
        TempFileStorage::in_dir(dir.path()),
    );
    let req = buffer
        .supply(b"PUT /doc HTTP/1.1\nContent-Length: 6\n\n")
        .supply(b"abc")
        .supply(b"def")
        .finish()
        .unwrap();

    let body = req.body.expect("body");
    assert_eq!(body.len(), 6);
    assert_eq!(body.into_bytes().unwrap(), b"abcdef");
}

#[test]
fn temp_file_body_is_readable() {
    let req = RequestBuffer::with_parts(ParserConfig::default(), DefaultHeaderFactory, TempFileStorage::new())
        .supply(b"POST / HTTP/1.1\n\nstreamed\n\n")
        .finish()
        .unwrap();

    let mut text = String::new();
    req.body.unwrap().read_to_string(&mut text).unwrap();
    assert_eq!(text, "streamed");
}

struct CountingStorage;

struct CountingSink(usize);

impl BodyStorage for CountingStorage {
    type Sink = CountingSink;

    fn create(&self) -> io::Result<CountingSink> {
        Ok(CountingSink(0))
    }
}

impl BodySink for CountingSink {
    type Content = usize;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0 += bytes.len();
        Ok(())
    }

    fn finalize(self) -> io::Result<usize> {
        Ok(self.0)
    }
}

#[test]
fn custom_storage_receives_body_bytes() {
    let req = RequestBuffer::with_parts(ParserConfig::default(), DefaultHeaderFactory, CountingStorage)
        .supply(b"POST / HTTP/1.1\nContent-Length: 5\n\nhel")
        .supply(b"lo, and more")
        .finish()
        .unwrap();
    assert_eq!(req.body, Some(5));
}

#[test]
fn storage_creation_failure_fails_the_parse() {
    struct NoSpace;

    impl BodyStorage for NoSpace {
        type Sink = CountingSink;

        fn create(&self) -> io::Result<CountingSink> {
            Err(io::Error::other("no space left"))
        }
    }

    let mut buffer = RequestBuffer::with_parts(ParserConfig::default(), DefaultHeaderFactory, NoSpace);
    // Bodiless requests never touch the storage.
    assert_eq!(buffer.feed(b"GET / HTTP/1.1\n\n").unwrap(), ParseStatus::Complete);

    let mut buffer = RequestBuffer::with_parts(ParserConfig::default(), DefaultHeaderFactory, NoSpace);
    assert_eq!(
        buffer.feed(b"POST / HTTP/1.1\nContent-Length: 1\n\n").unwrap_err(),
        ParseError::BodyStorage("no space left".into())
    );
}

// =========================================================================
// Output formats
// =========================================================================

#[test]
fn json_output_compact() {
    let req = parse_request(b"GET /hello HTTP/1.1\nHost: innmind.com\n\n").unwrap();
    let json = format_json(&req, false);
    assert!(json.contains("\"method\":\"GET\""));
    assert!(json.contains("\"target\":\"/hello\""));
    assert!(json.contains("\"version\":\"HTTP/1.1\""));
    assert!(json.contains("\"name\":\"Host\""));
    assert!(json.contains("\"body\":null"));
}

#[test]
fn json_output_pretty() {
    let req = parse_request(b"GET /pretty HTTP/1.1\r\n\r\n").unwrap();
    let json = format_json(&req, true);
    assert!(json.contains('\n'));
    assert!(json.contains("  "));
}

#[test]
fn json_output_with_body() {
    let req = parse_request(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata").unwrap();
    assert!(format_json(&req, false).contains("\"body\":\"data\""));
}

#[test]
fn debug_output_contains_sections() {
    let req = parse_request(b"GET /test HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    let dbg = format_debug(&req);
    assert!(dbg.contains("=== HTTP Request ==="));
    assert!(dbg.contains("Method:  GET"));
    assert!(dbg.contains("Target:  /test"));
    assert!(dbg.contains("Version: HTTP/1.1"));
    assert!(dbg.contains("--- Headers (1) ---"));
    assert!(dbg.contains("--- No Body ---"));
}

#[test]
fn debug_output_marks_binary_body() {
    let req = parse_request(b"POST / HTTP/1.1\nContent-Length: 2\n\n\xff\xfe").unwrap();
    assert!(format_debug(&req).contains("<binary data: 2 bytes>"));
}

#[test]
fn headers_only_output() {
    let raw = b"GET /path HTTP/1.1\r\nHost: example.com\r\nAccept: */*\r\n\r\n";
    let req = parse_request(raw).unwrap();
    assert_eq!(
        format_headers_only(&req),
        "GET /path HTTP/1.1\nHost: example.com\nAccept: */*\n"
    );
}
