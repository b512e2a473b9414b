//! Knowledge base corpus: record types, validation, and embedded datasets.

pub mod dataset;
pub mod entry;

pub use dataset::{STATIC_TOOLS, static_entries};
pub use entry::{
    Category, EntryError, Example, FixStep, KnowledgeEntry, Matchers, RootCause, Source,
    validate_entries,
};
