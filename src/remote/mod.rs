//! Chroma server REST surface
//!
//! Administrative calls used by provisioning, plus the `/api/v2` DTOs shared
//! with the HTTP client backend.

mod admin;
mod types;

pub use admin::{AdminApi, AdminResult, ApiStatus, HttpAdminApi, TransportError};
pub use types::*;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use url::Url;

use crate::config::{ClientConfig, ClientKind};

const CLOUD_TOKEN_HEADER: &str = "x-chroma-token";

/// Append percent-encoded path segments to a base URL
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("'{}' cannot be used as a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Default auth headers for a remote kind: cloud sends `x-chroma-token`,
/// http sends a bearer token when a key is set.
pub(crate) fn auth_headers(config: &ClientConfig) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    match (config.kind, config.api_key.as_deref()) {
        (ClientKind::Cloud, Some(key)) => {
            headers.insert(HeaderName::from_static(CLOUD_TOKEN_HEADER), sensitive(key)?);
        }
        (ClientKind::Cloud, None) => {
            return Err("cloud client requires CHROMA_API_KEY".to_string());
        }
        (_, Some(key)) => {
            headers.insert(AUTHORIZATION, sensitive(&bearer(key))?);
        }
        (_, None) => {}
    }
    Ok(headers)
}

fn sensitive(value: &str) -> Result<HeaderValue, String> {
    let mut header =
        HeaderValue::from_str(value).map_err(|e| format!("invalid header value: {}", e))?;
    header.set_sensitive(true);
    Ok(header)
}
