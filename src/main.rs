use errdoc_mcp::provider::{EntryProvider, SubmissionSink};
use errdoc_mcp::server::{ErrdocServer, ServerState};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging goes to stderr to avoid interfering with MCP protocol on stdout
    errdoc_mcp::tracing::init();

    tracing::info!("Starting errdoc-mcp MCP server");

    // Optional live document store; without it the compiled-in datasets serve
    // everything and submissions are not recorded.
    let store_root = std::env::var_os("ERRDOC_STORE_DIR").map(PathBuf::from);
    let provider = EntryProvider::select(store_root).await;
    let sink = match &provider {
        EntryProvider::LiveStore { root } => {
            Some(SubmissionSink::new(root.join("submissions.jsonl")))
        }
        EntryProvider::StaticFallback => None,
    };

    let server = ErrdocServer::new(ServerState::new(provider, sink));
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}
