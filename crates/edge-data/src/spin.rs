//! Spin outbound HTTP transport.

use async_trait::async_trait;
use edge_core::{EdgeResponse, Method};
use spin_sdk::http::{Method as SpinMethod, Request, Response};

use crate::client::{FetchError, FetchRequest, Transport};

/// Transport backed by `spin_sdk::http::send`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinTransport;

fn spin_method(method: Method) -> SpinMethod {
    match method {
        Method::Get => SpinMethod::Get,
        Method::Post => SpinMethod::Post,
        Method::Put => SpinMethod::Put,
        Method::Delete => SpinMethod::Delete,
        Method::Patch => SpinMethod::Patch,
        Method::Head => SpinMethod::Head,
        Method::Options => SpinMethod::Options,
        Method::Connect => SpinMethod::Connect,
        Method::Trace => SpinMethod::Trace,
        Method::Other(name) => SpinMethod::Other(name),
    }
}

#[async_trait(?Send)]
impl Transport for SpinTransport {
    async fn send(&self, request: FetchRequest) -> Result<EdgeResponse, FetchError> {
        let url = request.url.to_string();
        let headers = request.wire_headers();
        let FetchRequest { method, body, .. } = request;

        let mut builder = Request::builder();
        builder.method(spin_method(method)).uri(url.as_str());
        for (name, value) in &headers {
            builder.header(name.as_str(), value.as_str());
        }
        let outbound = builder.body(body).build();

        let response: Response =
            spin_sdk::http::send(outbound)
                .await
                .map_err(|e| FetchError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

        let status = *response.status();
        let headers = response
            .headers()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    value.as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();

        Ok(EdgeResponse::new(status, headers, response.into_body()))
    }
}
