//! Compiled-in datasets used when no live store is configured or reachable.
//!
//! Each tool partition ships as a JSON document embedded at build time and
//! parsed once on first access. The parsed vectors are validated with the
//! same filter the live store uses, so both provider variants hand the
//! engines identically shaped data.

use std::sync::LazyLock;

use super::entry::{KnowledgeEntry, validate_entries};

static KUBERNETES: LazyLock<Vec<KnowledgeEntry>> =
    LazyLock::new(|| load(include_str!("../../data/kubernetes.json"), "kubernetes"));

static DOCKER: LazyLock<Vec<KnowledgeEntry>> =
    LazyLock::new(|| load(include_str!("../../data/docker.json"), "docker"));

/// Tool partitions available in the static datasets.
pub const STATIC_TOOLS: &[&str] = &["kubernetes", "docker"];

fn load(json: &str, tool: &str) -> Vec<KnowledgeEntry> {
    let entries: Vec<KnowledgeEntry> =
        serde_json::from_str(json).expect("embedded dataset is valid JSON");
    let valid = validate_entries(entries);
    tracing::debug!("Loaded {} static entries for '{}'", valid.len(), tool);
    valid
}

/// Returns the static entries for one tool, or every partition combined when
/// no tool is given. Unknown tools yield an empty vector.
pub fn static_entries(tool: Option<&str>) -> Vec<KnowledgeEntry> {
    match tool {
        Some("kubernetes") => KUBERNETES.clone(),
        Some("docker") => DOCKER.clone(),
        Some(other) => {
            tracing::warn!("No static dataset for tool '{}'", other);
            Vec::new()
        }
        None => {
            let mut all = KUBERNETES.clone();
            all.extend(DOCKER.iter().cloned());
            all
        }
    }
}
