//! MCP server implementation and shared state.

use crate::matcher::MatcherEngine;
use crate::provider::{EntryProvider, SubmissionSink};
use crate::search::SearchEngine;
use crate::tools::explain::{ExplainRequest, handle_explain};
use crate::tools::lookup::{LookupRequest, handle_lookup};
use crate::tools::search::{SearchErrorsRequest, handle_search};
use crate::tools::suggest::{SuggestRequest, handle_suggest};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// Everything a tool handler needs: the corpus provider, both engines, and
/// the optional audit sink. The engines hold only their weight tables, so
/// sharing one state value across concurrent requests needs no locking.
#[derive(Debug)]
pub struct ServerState {
    pub provider: EntryProvider,
    pub matcher: MatcherEngine,
    pub search: SearchEngine,
    pub sink: Option<SubmissionSink>,
}

impl ServerState {
    /// State with the reference engine configurations.
    pub fn new(provider: EntryProvider, sink: Option<SubmissionSink>) -> Self {
        Self {
            provider,
            matcher: MatcherEngine::with_defaults(),
            search: SearchEngine::with_defaults(),
            sink,
        }
    }
}

/// MCP server for known-error documentation lookups.
#[derive(Clone)]
pub struct ErrdocServer {
    state: Arc<ServerState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ErrdocServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrdocServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl ErrdocServer {
    pub fn new(state: ServerState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Explain an error message. Paste raw error text (CLI output, log lines, events) and get the best-matching known error with root causes, fix steps, and source links, plus a confidence score."
    )]
    async fn explain_error(
        &self,
        Parameters(request): Parameters<ExplainRequest>,
    ) -> std::result::Result<String, String> {
        handle_explain(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Search the known-error knowledge base. Finds entries by slug, alias, matcher pattern, or fuzzy word overlap, with optional category filtering and pagination."
    )]
    async fn search_errors(
        &self,
        Parameters(request): Parameters<SearchErrorsRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Suggest search queries for a partial input. Returns matching aliases and titles, or a list of popular queries when the input is under 2 characters."
    )]
    async fn suggest_queries(
        &self,
        Parameters(request): Parameters<SuggestRequest>,
    ) -> std::result::Result<String, String> {
        handle_suggest(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }

    #[tool(
        description = "Fetch one knowledge base entry by tool and canonical slug, including all root causes, fix steps, clarifying questions, and examples."
    )]
    async fn lookup_error(
        &self,
        Parameters(request): Parameters<LookupRequest>,
    ) -> std::result::Result<String, String> {
        handle_lookup(&self.state, request)
            .await
            .map_err(|e| e.to_string())
    }
}

#[tool_handler]
impl ServerHandler for ErrdocServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "errdoc-mcp: a known-error documentation lookup server. \
             Use explain_error with pasted error text to identify the problem and get fixes, \
             search_errors to browse the knowledge base, and lookup_error for full entry details."
                .to_string(),
        );
        info
    }
}
