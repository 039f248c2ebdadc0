//! Inbound request and outbound response types.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use url::Url;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        let id = format!(
            "{:x}-{:x}-{:x}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            rand_simple(),
            rand_simple()
        );
        Self(id)
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

fn rand_simple() -> u32 {
    // LCG step; WASM components have no OS randomness we want to pay for here.
    static SEED: AtomicU32 = AtomicU32::new(12345);
    let next = SEED
        .load(Ordering::Relaxed)
        .wrapping_mul(1103515245)
        .wrapping_add(12345);
    SEED.store(next, Ordering::Relaxed);
    next
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP headers, in arrival order. Duplicate names are allowed.
pub type Headers = Vec<(String, String)>;

/// HTTP method.
///
/// Methods without a dedicated variant are carried verbatim in `Other` so
/// they can still be forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
    Other(String),
}

impl Method {
    /// Convert to HTTP method string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Other(name) => name,
        }
    }
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

impl std::str::FromStr for Method {
    type Err = RequestError;

    /// Standard methods match case-insensitively; any other valid token is
    /// kept as given.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "CONNECT" => Ok(Self::Connect),
            "TRACE" => Ok(Self::Trace),
            _ if !s.is_empty() && s.bytes().all(is_token_char) => Ok(Self::Other(s.to_string())),
            _ => Err(RequestError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while building an [`EdgeRequest`].
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),
}

/// The inbound request as observed by the handler.
///
/// The handler never mutates it: every rewrite works on a copy of `url`.
#[derive(Debug, Clone)]
pub struct EdgeRequest {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// HTTP headers.
    pub headers: Headers,
    /// Raw request body. Empty when the request carries none.
    pub body: Vec<u8>,
}

impl EdgeRequest {
    /// Create a bodiless request for an absolute URL.
    pub fn new(method: Method, url: &str) -> Result<Self, RequestError> {
        let url = Url::parse(url).map_err(|source| RequestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        Ok(Self::from_url(method, url))
    }

    /// Create a bodiless request from an already parsed URL.
    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the request submits data (non-empty body).
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response handed back to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Response body.
    pub body: Vec<u8>,
}

impl EdgeResponse {
    /// Create a new response.
    pub fn new(status: u16, headers: Headers, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a permanent (301) redirect to `location`.
    pub fn moved_permanently(location: impl Into<String>) -> Self {
        Self::new(301, vec![("location".to_string(), location.into())], Vec::new())
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// First `max_chars` characters of the body, decoded lossily.
    pub fn body_preview(&self, max_chars: usize) -> String {
        String::from_utf8_lossy(&self.body)
            .chars()
            .take(max_chars)
            .collect()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("trace".parse::<Method>().unwrap(), Method::Trace);
    }

    #[test]
    fn test_method_parse_keeps_extension_methods() {
        let purge = "PURGE".parse::<Method>().unwrap();
        assert_eq!(purge, Method::Other("PURGE".to_string()));
        assert_eq!(purge.as_str(), "PURGE");
        assert!("".parse::<Method>().is_err());
        assert!("GET /".parse::<Method>().is_err());
    }

    #[test]
    fn test_request_rejects_relative_url() {
        let err = EdgeRequest::new(Method::Get, "/landing").unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl { .. }));
    }

    #[test]
    fn test_request_has_body() {
        let req = EdgeRequest::new(Method::Post, "https://example.com/form").unwrap();
        assert!(!req.has_body());
        assert!(req.with_body("a=1").has_body());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = EdgeRequest::new(Method::Get, "https://example.com/")
            .unwrap()
            .with_header("Accept-Language", "en-AU");
        assert_eq!(req.header("accept-language"), Some("en-AU"));
        assert_eq!(req.header("cookie"), None);
    }

    #[test]
    fn test_moved_permanently() {
        let resp = EdgeResponse::moved_permanently("https://example.com/a?x=1");
        assert_eq!(resp.status, 301);
        assert_eq!(resp.header("Location"), Some("https://example.com/a?x=1"));
        assert!(resp.body.is_empty());
    }

    #[test]
    fn test_body_preview_truncates_on_chars() {
        let resp = EdgeResponse::new(500, Vec::new(), "héllo world".as_bytes().to_vec());
        assert_eq!(resp.body_preview(5), "héllo");
        assert_eq!(resp.body_preview(100), "héllo world");
    }
}
