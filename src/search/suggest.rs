//! Query suggestions for the search box.

use ahash::AHashSet;

use crate::corpus::KnowledgeEntry;
use crate::normalize::{char_len, normalize};

use super::engine::SearchEngine;

/// Historically popular queries, served when the input is too short to
/// suggest against.
pub const POPULAR_QUERIES: &[&str] = &[
    "pod pending",
    "image pull error",
    "node not ready",
    "crashloopbackoff",
    "service unavailable",
    "forbidden",
    "network unreachable",
    "oom killed",
    "volume mount failed",
    "certificate expired",
];

/// Caps matching the reference behavior: aliases fill up to 8 slots, titles
/// top the list up to 10 total.
const ALIAS_CAP: usize = 8;
const TOTAL_CAP: usize = 10;

impl SearchEngine {
    /// Suggests queries for a partial input: alias matches first, then title
    /// matches, deduplicated, at most 10. Inputs under 2 characters get the
    /// popular-query list instead.
    pub fn suggestions(&self, query: &str, entries: &[KnowledgeEntry]) -> Vec<String> {
        if char_len(query) < 2 {
            return POPULAR_QUERIES.iter().map(ToString::to_string).collect();
        }

        let normalized = normalize(query);
        let mut seen = AHashSet::new();
        let mut suggestions: Vec<String> = Vec::new();

        'aliases: for entry in entries {
            for alias in &entry.aliases {
                if normalize(alias).contains(&normalized) && seen.insert(alias.clone()) {
                    suggestions.push(alias.clone());
                    if suggestions.len() >= ALIAS_CAP {
                        break 'aliases;
                    }
                }
            }
        }

        for entry in entries {
            if suggestions.len() >= TOTAL_CAP {
                break;
            }
            if normalize(&entry.title).contains(&normalized) && seen.insert(entry.title.clone()) {
                suggestions.push(entry.title.clone());
            }
        }

        suggestions.truncate(TOTAL_CAP);
        suggestions
    }
}
