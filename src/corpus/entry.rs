//! Knowledge base record types and per-record validation.
//!
//! One [`KnowledgeEntry`] documents one known error: how to recognize it
//! (aliases and regex matchers), what causes it, and how to fix it. Entries
//! are immutable at request time; the engines receive them as plain slices
//! and never mutate them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Fixed category taxonomy. Categories carry historical prior likelihood,
/// which both engines turn into score boosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Auth,
    Network,
    Runtime,
    Config,
    Storage,
    Scheduler,
    Cluster,
    Registry,
    Scheduling,
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Runtime => "runtime",
            Self::Config => "config",
            Self::Storage => "storage",
            Self::Scheduler => "scheduler",
            Self::Cluster => "cluster",
            Self::Registry => "registry",
            Self::Scheduling => "scheduling",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auth" => Ok(Self::Auth),
            "network" => Ok(Self::Network),
            "runtime" => Ok(Self::Runtime),
            "config" => Ok(Self::Config),
            "storage" => Ok(Self::Storage),
            "scheduler" => Ok(Self::Scheduler),
            "cluster" => Ok(Self::Cluster),
            "registry" => Ok(Self::Registry),
            "scheduling" => Ok(Self::Scheduling),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Link to upstream documentation backing a cause, step, or example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub label: String,
}

/// One plausible root cause with its own prior confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCause {
    pub name: String,
    pub why: String,
    /// Prior likelihood of this cause, in [0, 1]. Weighted into the matcher's
    /// cause signal.
    pub confidence: f64,
    pub sources: Vec<Source>,
}

/// One remediation step with the commands to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixStep {
    pub step: String,
    pub commands: Vec<String>,
    pub sources: Vec<Source>,
}

/// A concrete observed instance of the error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub name: String,
    pub symptom: String,
    pub fix: String,
    pub sources: Vec<Source>,
}

/// Regex patterns that, when found in input text, indicate this entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Matchers {
    pub regex: Vec<String>,
}

/// One documented error in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Originating system ("kubernetes", "docker", ...). Partitions the
    /// corpus; slugs are unique within a partition.
    pub tool: String,
    /// Stable lowercase hyphenated identifier, the primary key within a tool.
    pub canonical_slug: String,
    pub title: String,
    /// Alternative phrasings, ordered by how commonly they appear.
    pub aliases: Vec<String>,
    pub matchers: Matchers,
    pub category: Category,
    pub summary: String,
    pub root_causes: Vec<RootCause>,
    pub fix_steps: Vec<FixStep>,
    /// Follow-ups to ask when match confidence is low.
    pub clarifying_questions: Vec<String>,
    pub examples: Vec<Example>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a record was rejected during validation.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("duplicate slug '{slug}' in tool '{tool}'")]
    DuplicateSlug { tool: String, slug: String },
    #[error("cause '{name}' has confidence {value} outside [0, 1]")]
    CauseConfidence { name: String, value: f64 },
    #[error("malformed source url '{url}': {reason}")]
    SourceUrl { url: String, reason: String },
}

impl KnowledgeEntry {
    /// Checks the record-level invariants: cause confidences in [0, 1] and
    /// every source URL well-formed. Slug uniqueness is a corpus-level
    /// invariant checked in [`validate_entries`].
    pub fn validate(&self) -> Result<(), EntryError> {
        for cause in &self.root_causes {
            if !(0.0..=1.0).contains(&cause.confidence) {
                return Err(EntryError::CauseConfidence {
                    name: cause.name.clone(),
                    value: cause.confidence,
                });
            }
        }

        let sources = self
            .root_causes
            .iter()
            .flat_map(|c| &c.sources)
            .chain(self.fix_steps.iter().flat_map(|s| &s.sources))
            .chain(self.examples.iter().flat_map(|e| &e.sources));

        for source in sources {
            if let Err(e) = Url::parse(&source.url) {
                return Err(EntryError::SourceUrl {
                    url: source.url.clone(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Validates a batch of entries, dropping invalid records and duplicate
/// slugs (first occurrence wins) with a warning. The engines downstream
/// assume everything they receive passed this filter.
pub fn validate_entries(entries: Vec<KnowledgeEntry>) -> Vec<KnowledgeEntry> {
    let mut seen = ahash::AHashSet::new();
    let mut valid = Vec::with_capacity(entries.len());

    for entry in entries {
        if let Err(e) = entry.validate() {
            tracing::warn!("Dropping invalid entry '{}': {}", entry.canonical_slug, e);
            continue;
        }
        if !seen.insert((entry.tool.clone(), entry.canonical_slug.clone())) {
            let e = EntryError::DuplicateSlug {
                tool: entry.tool.clone(),
                slug: entry.canonical_slug.clone(),
            };
            tracing::warn!("Dropping entry: {}", e);
            continue;
        }
        valid.push(entry);
    }

    valid
}
