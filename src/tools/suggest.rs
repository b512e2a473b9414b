//! Suggestion handler: completions for a partial search input.

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::server::ServerState;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SuggestRequest {
    /// Partial query typed so far. Inputs under 2 characters return the
    /// popular-query list.
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<String>,
}

pub async fn handle_suggest(state: &ServerState, request: SuggestRequest) -> Result<String> {
    let entries = state.provider.find_all(None).await;
    let suggestions = state.search.suggestions(&request.query, &entries);

    Ok(serde_json::to_string_pretty(&SuggestResponse {
        suggestions,
    })?)
}
