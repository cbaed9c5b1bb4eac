//! Distribution-endpoint lookup: `GET <endpoint>/<chapter id>` → `{"baseUrl": ...}`.
//!
//! The base URL rotates and expires, so it is resolved once per chapter and
//! never cached.

use super::{is_success, HttpClient, ResolveError};
use crate::model::DistributionInfo;

/// Builds the resolve URL for a chapter.
pub fn resolve_url(endpoint: &str, chapter_id: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), chapter_id)
}

/// Resolves the distribution base for `chapter_id`. Runs the request on the blocking pool.
pub async fn resolve_distribution(
    client: &HttpClient,
    endpoint: &str,
    chapter_id: &str,
) -> Result<DistributionInfo, ResolveError> {
    let url = resolve_url(endpoint, chapter_id);
    let client = client.clone();
    let (code, body) = tokio::task::spawn_blocking(move || client.get_bytes(&url))
        .await
        .map_err(|e| ResolveError::Task(e.to_string()))??;
    parse_response(code, &body)
}

/// Validates status and body of a resolve response.
fn parse_response(code: u32, body: &[u8]) -> Result<DistributionInfo, ResolveError> {
    if !is_success(code) {
        return Err(ResolveError::Status {
            code,
            body: String::from_utf8_lossy(body).trim().to_string(),
        });
    }
    let info: DistributionInfo = serde_json::from_slice(body)?;
    if info.base_url.is_empty() {
        return Err(ResolveError::EmptyBaseUrl);
    }
    Ok(info)
}
