//! Conversion of the platform's inbound request into an [`EdgeRequest`].

use edge_sdk::edge_core::{EdgeRequest, Headers, Method, RequestError};

/// Header Spin sets to the absolute URL of the inbound request.
pub const SPIN_FULL_URL: &str = "spin-full-url";

const SPIN_HEADER_PREFIX: &str = "spin-";

fn is_spin_header(name: &str) -> bool {
    name.get(..SPIN_HEADER_PREFIX.len())
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case(SPIN_HEADER_PREFIX))
}

/// Build the handler's view of an inbound request.
///
/// The absolute URL comes from [`SPIN_FULL_URL`] when present, otherwise from
/// `uri`. Spin's own routing headers stay at the edge.
pub fn edge_request(
    method: &str,
    uri: &str,
    headers: Headers,
    body: Vec<u8>,
) -> Result<EdgeRequest, RequestError> {
    let method = method.parse::<Method>()?;
    let url = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SPIN_FULL_URL))
        .map_or(uri, |(_, value)| value.as_str());
    let mut request = EdgeRequest::new(method, url)?.with_body(body);

    request.headers = headers
        .into_iter()
        .filter(|(name, _)| !is_spin_header(name))
        .collect();
    Ok(request)
}
