//! Lookup handler: fetch one knowledge base entry by its slug.

use anyhow::bail;
use rmcp::schemars;
use serde::Deserialize;

use crate::error::Result;
use crate::server::ServerState;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupRequest {
    /// Tool partition the entry belongs to (e.g. "kubernetes", "docker")
    pub tool: String,
    /// Canonical slug of the entry
    pub slug: String,
}

/// Serializes the full entry, including causes, fix steps, and examples.
pub async fn handle_lookup(state: &ServerState, request: LookupRequest) -> Result<String> {
    match state
        .provider
        .find_by_slug(&request.tool, &request.slug)
        .await
    {
        Some(entry) => Ok(serde_json::to_string_pretty(&entry)?),
        None => bail!(
            "No entry '{}' in tool '{}'. Use search_errors to find the right slug.",
            request.slug,
            request.tool
        ),
    }
}
