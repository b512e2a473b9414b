//! Search handler: browse the knowledge base with ranking, category facets,
//! and pagination.

use anyhow::bail;
use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::corpus::Category;
use crate::error::Result;
use crate::provider::DataSource;
use crate::search::{MatchType, SearchResult};
use crate::server::ServerState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchErrorsRequest {
    /// Search query: a slug, an alias, or free-form words
    pub query: String,
    /// Optional category filter (e.g. "runtime", "network", "auth")
    #[serde(default)]
    pub category: Option<String>,
    /// 1-based page number (default: 1)
    #[serde(default)]
    pub page: Option<usize>,
    /// Results per page (default: 20, max: 100)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// One hit, trimmed to what a browsing client needs. Full entries are served
/// by the lookup tool.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub tool: String,
    pub slug: String,
    pub title: String,
    pub category: Category,
    pub summary: String,
    pub score: f64,
    pub match_type: MatchType,
    pub matched_text: String,
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        Self {
            tool: result.entry.tool,
            slug: result.entry.canonical_slug,
            title: result.entry.title,
            category: result.entry.category,
            summary: result.entry.summary,
            score: result.score,
            match_type: result.match_type,
            matched_text: result.matched_text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchErrorsResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub query: String,
    pub page: usize,
    pub page_size: usize,
    pub categories: Vec<Category>,
    pub execution_time_ms: u64,
    pub data_source: DataSource,
}

/// Runs a search over every tool partition and serializes one result page.
pub async fn handle_search(state: &ServerState, request: SearchErrorsRequest) -> Result<String> {
    let category = match request.category.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(e) => bail!(
                "{e}; expected one of auth, network, runtime, config, storage, scheduler, cluster, registry, scheduling, unknown"
            ),
        },
    };
    let page = request.page.unwrap_or(1).max(1);
    let page_size = request
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let entries = state.provider.find_all(None).await;
    let response = state
        .search
        .search(&request.query, &entries, category, page, page_size);

    let response = SearchErrorsResponse {
        results: response.results.into_iter().map(SearchHit::from).collect(),
        total: response.total,
        query: response.query,
        page: response.page,
        page_size: response.page_size,
        categories: response.categories,
        execution_time_ms: response.execution_time_ms,
        data_source: state.provider.source(),
    };

    Ok(serde_json::to_string_pretty(&response)?)
}
