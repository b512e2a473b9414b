//! Match-scoring engine: turns noisy error text into a ranked set of
//! knowledge-base candidates with a calibrated confidence score.

pub mod config;
pub mod engine;

pub use config::MatcherConfig;
pub use engine::{MatchDetail, MatchResult, MatchSignal, MatcherEngine, Suggestion};
