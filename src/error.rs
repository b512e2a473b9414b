//! Error handling types and utilities.

/// A specialized Result type for errdoc-mcp operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()`
/// and `.with_context()` methods throughout the codebase. The scoring and
/// search engines themselves are total functions and never return errors;
/// this alias covers the provider, sink, and server plumbing around them.
pub type Result<T> = anyhow::Result<T>;
