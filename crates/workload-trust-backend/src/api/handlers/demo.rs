//! Demo Flow Handler
//!
//! Runs both trust hops for one request and reports them. A failed database
//! hop is still a 200: the body says which hop failed and why.

use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::{debug, info};

use workload_trust_core::{AggregateResult, Order, RequestContext, TrustError, UpstreamTrust};

use super::AppState;
use crate::api::error::ApiError;
use crate::config::BackendConfig;

/// Header Envoy uses to forward the verified client certificate details
pub const FORWARDED_CLIENT_CERT: &str = "x-forwarded-client-cert";

/// Run the full demo flow
///
/// GET /api/demo
pub async fn run_demo(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<AggregateResult<Order>>, ApiError> {
    let upstream = upstream_trust(&headers, &state.config)?;
    let ctx = RequestContext::with_timeout(state.config.hop_timeout);

    let result: AggregateResult<Order> = state
        .aggregator
        .run_demo_flow(&ctx, &upstream, &state.orders)
        .await;

    info!(
        frontend_to_backend = result.hop1.success,
        backend_to_database = result.hop2.success,
        orders_count = result.payload.len(),
        "Demo flow completed"
    );

    Ok(Json(result))
}

/// Build the delegated-trust token for a request the proxy let through
///
/// When the proxy forwards client certificate details, the caller identity
/// is the `URI` of the last (nearest) element. Without a usable header the
/// configured frontend identity is assumed, unless the deployment requires
/// the header.
pub fn upstream_trust(headers: &HeaderMap, config: &BackendConfig) -> Result<UpstreamTrust, TrustError> {
    let forwarded = match headers.get(FORWARDED_CLIENT_CERT).map(|v| v.to_str()) {
        None => Err(format!("proxy did not forward {}", FORWARDED_CLIENT_CERT)),
        Some(Err(_)) => Err(format!("{} is not valid ASCII", FORWARDED_CLIENT_CERT)),
        Some(Ok(value)) => {
            forwarded_uri(value).ok_or_else(|| format!("no URI in {}", FORWARDED_CLIENT_CERT))
        }
    };

    match forwarded {
        Ok(uri) => Ok(UpstreamTrust::delegated(uri)),
        Err(reason) if config.require_forwarded_identity => {
            Err(TrustError::MalformedUpstreamTrust(reason))
        }
        Err(reason) => {
            debug!(reason = %reason, "Using configured frontend identity");
            Ok(UpstreamTrust::delegated(config.frontend_spiffe_id.clone()))
        }
    }
}

/// `URI` of the nearest hop in an XFCC header value
fn forwarded_uri(value: &str) -> Option<String> {
    let elements = split_unquoted(value, ',');
    let nearest = elements.last()?;
    split_unquoted(nearest, ';')
        .into_iter()
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("uri"))
        .map(|(_, uri)| uri.trim().trim_matches('"').to_string())
        .filter(|uri| !uri.is_empty())
}

/// Split on `sep` outside double quotes; `\"` inside quotes is literal
fn split_unquoted(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;

    for (i, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            c if c == sep && !quoted => {
                parts.push(&value[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts
}
