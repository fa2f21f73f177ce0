use serde::Serialize;

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A single HTTP header field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header field name (original casing preserved).
    pub name: String,
    /// Header field value, exactly as it followed `": "` on the line.
    pub value: String,
    /// Typed interpretation of the value.
    #[serde(skip)]
    pub kind: HeaderKind,
}

/// What a [`HeaderFactory`] recognized a header as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderKind {
    /// `Content-Length` with a valid non-negative length.
    ContentLength(u64),
    /// `Host`, split into host name and optional port.
    Host { host: String, port: Option<u16> },
    /// `Cookie`, as `(name, value)` pairs in order.
    Cookie(Vec<(String, String)>),
    /// Any other header, or a known one whose value did not parse.
    Raw,
}

impl Header {
    /// Build an untyped header.
    pub fn raw(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: HeaderKind::Raw,
        }
    }

    /// Case-insensitive name comparison.
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// Header fields in arrival order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one header, keeping arrival order.
    pub fn push(&mut self, header: Header) {
        self.0.push(header);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.0.iter()
    }

    /// First header named `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.0.iter().find(|h| h.is(name))
    }

    /// Every header named `name` (case-insensitive), in arrival order.
    pub fn get_all<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Header> + use<'a, 'n> {
        self.0.iter().filter(move |h| h.is(name))
    }

    /// The first well-formed `Content-Length`.
    ///
    /// Headers named `Content-Length` whose value did not parse are `Raw`
    /// and are skipped.
    pub fn content_length(&self) -> Option<u64> {
        self.0.iter().find_map(|h| match h.kind {
            HeaderKind::ContentLength(length) => Some(length),
            _ => None,
        })
    }

    /// The first well-formed `Host`, as `(host, port)`.
    pub fn host(&self) -> Option<(&str, Option<u16>)> {
        self.0.iter().find_map(|h| match &h.kind {
            HeaderKind::Host { host, port } => Some((host.as_str(), *port)),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Turns a raw `(name, value)` pair from a header line into a [`Header`].
///
/// Returning `None` rejects the header and fails the whole parse.
pub trait HeaderFactory {
    fn create(&self, name: &str, value: &str) -> Option<Header>;
}

impl<F> HeaderFactory for F
where
    F: Fn(&str, &str) -> Option<Header>,
{
    fn create(&self, name: &str, value: &str) -> Option<Header> {
        self(name, value)
    }
}

/// Registry of the typed headers the parser knows about.
///
/// Each known name is tried against its typed parser; a value that does not
/// parse falls back to a [`HeaderKind::Raw`] header instead of failing.
/// Never rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHeaderFactory;

impl HeaderFactory for DefaultHeaderFactory {
    fn create(&self, name: &str, value: &str) -> Option<Header> {
        let typed = if name.eq_ignore_ascii_case("content-length") {
            parse_content_length(value).map(HeaderKind::ContentLength)
        } else if name.eq_ignore_ascii_case("host") {
            parse_host(value)
        } else if name.eq_ignore_ascii_case("cookie") {
            parse_cookie(value).map(HeaderKind::Cookie)
        } else {
            return Some(Header::raw(name, value));
        };

        let kind = typed.unwrap_or_else(|| {
            tracing::warn!(header = name, value, "unparsable header value kept as raw");
            HeaderKind::Raw
        });

        Some(Header {
            name: name.to_owned(),
            value: value.to_owned(),
            kind,
        })
    }
}

/// ASCII digits only; a sign or whitespace makes the value unparsable.
fn parse_content_length(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn parse_host(value: &str) -> Option<HeaderKind> {
    // IPv6 literals keep their brackets and may be followed by a port.
    let (host, port) = if value.starts_with('[') {
        let end = value.find(']')? + 1;
        match &value[end..] {
            "" => (&value[..end], None),
            rest => (&value[..end], Some(rest.strip_prefix(':')?)),
        }
    } else {
        match value.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (value, None),
        }
    };

    if host.is_empty() || host.bytes().any(|b| b.is_ascii_whitespace() || b == b'/') {
        return None;
    }
    let port = match port {
        Some(port) => Some(port.parse::<u16>().ok()?),
        None => None,
    };

    Some(HeaderKind::Host {
        host: host.to_owned(),
        port,
    })
}

fn parse_cookie(value: &str) -> Option<Vec<(String, String)>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=')?;
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.to_owned()))
        })
        .collect()
}
