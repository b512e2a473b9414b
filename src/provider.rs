//! Corpus access with transparent fallback, plus the submission audit sink.
//!
//! The engines only ever see plain entry vectors. Where those vectors come
//! from is decided here: a live store (a directory of per-tool JSON document
//! files) when one is configured and reachable, otherwise the datasets
//! compiled into the binary. Selection happens once at startup via
//! [`EntryProvider::select`]; per-call failures still degrade to the static
//! data so a flaky disk never takes lookups down.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::{self, KnowledgeEntry, validate_entries};
use crate::error::Result;
use crate::matcher::MatchResult;

/// Where entries were served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Static,
}

/// Polymorphic corpus capability: a live document store or the compiled-in
/// fallback. Both variants return validated entries with identical shape.
#[derive(Debug, Clone)]
pub enum EntryProvider {
    /// Directory holding one `<tool>.json` document file per partition.
    LiveStore { root: PathBuf },
    /// Datasets embedded at build time.
    StaticFallback,
}

impl EntryProvider {
    /// Health-checks the configured store root and picks the variant. A
    /// missing or unreadable directory selects the static fallback; the
    /// engines never learn the difference.
    pub async fn select(root: Option<PathBuf>) -> Self {
        let Some(root) = root else {
            tracing::info!("No live store configured, serving static datasets");
            return Self::StaticFallback;
        };

        match tokio::fs::read_dir(&root).await {
            Ok(_) => {
                tracing::info!("Using live store at {}", root.display());
                Self::LiveStore { root }
            }
            Err(e) => {
                tracing::warn!(
                    "Live store at {} unavailable ({}), serving static datasets",
                    root.display(),
                    e
                );
                Self::StaticFallback
            }
        }
    }

    pub fn source(&self) -> DataSource {
        match self {
            Self::LiveStore { .. } => DataSource::Live,
            Self::StaticFallback => DataSource::Static,
        }
    }

    /// Returns validated entries for one tool, or every partition when no
    /// tool is given. A live store that fails or comes back empty falls back
    /// to the static datasets for the same selection.
    pub async fn find_all(&self, tool: Option<&str>) -> Vec<KnowledgeEntry> {
        let root = match self {
            Self::StaticFallback => return corpus::static_entries(tool),
            Self::LiveStore { root } => root,
        };

        let loaded = match tool {
            Some(tool) => read_documents(&root.join(format!("{tool}.json"))).await,
            None => read_all_documents(root).await,
        };

        match loaded {
            Ok(entries) => {
                let valid = validate_entries(entries);
                if valid.is_empty() {
                    tracing::warn!("Live store returned no valid entries, using static fallback");
                    corpus::static_entries(tool)
                } else {
                    valid
                }
            }
            Err(e) => {
                tracing::warn!("Live store query failed, using static fallback: {:#}", e);
                corpus::static_entries(tool)
            }
        }
    }

    /// Looks up a single entry by its primary key within a tool partition.
    pub async fn find_by_slug(&self, tool: &str, slug: &str) -> Option<KnowledgeEntry> {
        self.find_all(Some(tool))
            .await
            .into_iter()
            .find(|entry| entry.canonical_slug == slug)
    }
}

async fn read_documents(path: &Path) -> Result<Vec<KnowledgeEntry>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Reads every `*.json` document file under the store root. Files are read
/// in name order so corpus order (and therefore tie-breaking) stays
/// deterministic across platforms. Unparsable files are skipped with a
/// warning rather than failing the whole query.
async fn read_all_documents(root: &Path) -> Result<Vec<KnowledgeEntry>> {
    let mut dir = tokio::fs::read_dir(root)
        .await
        .with_context(|| format!("listing {}", root.display()))?;

    let mut paths = Vec::new();
    while let Some(dir_entry) = dir.next_entry().await? {
        let path = dir_entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut all = Vec::new();
    for path in paths {
        match read_documents(&path).await {
            Ok(entries) => all.extend(entries),
            Err(e) => tracing::warn!("Skipping unreadable document file: {:#}", e),
        }
    }
    Ok(all)
}

/// One audit record per explain call: what was asked and what we answered.
/// Append-only; there is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub raw_text: String,
    pub normalized_text: String,
    pub matched_slug: Option<String>,
    pub matched_confidence: f64,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(raw_text: &str, normalized_text: &str, result: &MatchResult) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            normalized_text: normalized_text.to_string(),
            matched_slug: result.slug.clone(),
            matched_confidence: result.confidence,
            created_at: Utc::now(),
        }
    }
}

/// Appends submissions to a JSONL file, one record per line. Fire-and-forget:
/// every failure is logged at warn and swallowed, so auditing can never
/// affect a match response.
#[derive(Debug, Clone)]
pub struct SubmissionSink {
    path: PathBuf,
}

impl SubmissionSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn record(&self, submission: Submission) {
        let line = match serde_json::to_string(&submission) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to serialize submission: {}", e);
                return;
            }
        };

        let path = self.path.clone();
        // Append in spawn_blocking; tokio has no append-aware free function.
        let outcome = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            use std::io::Write as _;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            writeln!(file, "{}", line)
        })
        .await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to record submission: {}", e),
            Err(e) => tracing::warn!("Submission write task panicked: {}", e),
        }
    }
}
