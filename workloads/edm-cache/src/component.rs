//! Spin HTTP component entry point.

use anyhow::Context;
use spin_sdk::http::{IntoResponse, Method as SpinMethod, Request, Response};
use spin_sdk::http_component;

use edge_sdk::prelude::*;

use crate::config::EdgeConfig;
use crate::handler::EdgeHandler;
use crate::inbound::edge_request;

/// Spin variable holding the origin server's base URL.
const ORIGIN_URL_VARIABLE: &str = "origin_url";

/// EDM cache handler.
#[http_component]
async fn handle_edm_cache(req: Request) -> anyhow::Result<impl IntoResponse> {
    let request = inbound_request(&req)?;
    let handler = EdgeHandler::new(load_config()?, SpinTransport, BlockingDelay);
    let response = handler
        .handle(&request)
        .await
        .with_context(|| format!("origin fetch failed for {}", request.url))?;
    Ok(spin_response(response))
}

fn load_config() -> anyhow::Result<EdgeConfig> {
    let config = EdgeConfig::default();
    match spin_sdk::variables::get(ORIGIN_URL_VARIABLE) {
        Ok(origin) if !origin.is_empty() => config
            .with_origin_url(&origin)
            .with_context(|| format!("invalid {} variable: {}", ORIGIN_URL_VARIABLE, origin)),
        _ => Ok(config),
    }
}

fn inbound_request(req: &Request) -> anyhow::Result<EdgeRequest> {
    let headers = req
        .headers()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();

    edge_request(method_name(req.method()), req.uri(), headers, req.body().to_vec())
        .context("malformed inbound request")
}

fn method_name(method: &SpinMethod) -> &str {
    match method {
        SpinMethod::Get => "GET",
        SpinMethod::Post => "POST",
        SpinMethod::Put => "PUT",
        SpinMethod::Delete => "DELETE",
        SpinMethod::Patch => "PATCH",
        SpinMethod::Head => "HEAD",
        SpinMethod::Options => "OPTIONS",
        SpinMethod::Connect => "CONNECT",
        SpinMethod::Trace => "TRACE",
        SpinMethod::Other(name) => name,
    }
}

fn spin_response(response: EdgeResponse) -> Response {
    let mut builder = Response::builder();
    builder.status(response.status);
    for (name, value) in &response.headers {
        builder.header(name.as_str(), value.as_str());
    }
    builder.body(response.body).build()
}
