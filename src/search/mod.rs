//! Full-text search infrastructure for browsing the knowledge base.

pub mod engine;
pub mod suggest;

pub use engine::{MatchType, SearchConfig, SearchEngine, SearchResponse, SearchResult};
pub use suggest::POPULAR_QUERIES;
