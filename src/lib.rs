pub mod corpus;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod provider;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;

pub use corpus::{Category, KnowledgeEntry};
pub use matcher::{MatchResult, MatcherConfig, MatcherEngine};
pub use normalize::{normalize, tokenize};
pub use provider::{EntryProvider, SubmissionSink};
pub use search::{SearchConfig, SearchEngine, SearchResponse};
pub use server::{ErrdocServer, ServerState};
