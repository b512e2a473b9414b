//! Shared test fixtures and utilities for integration tests.
//!
//! # Fixtures
//!
//! - `sample_corpus`: a small hand-built corpus with known scoring behavior
//! - `crashloop_entry`: the canonical CrashLoopBackOff entry used by the
//!   end-to-end scenarios
//! - [`TempStore`]: a temporary live-store directory holding per-tool JSON
//!   document files, cleaned up on drop

use chrono::{TimeZone, Utc};
use errdoc_mcp::corpus::{Category, FixStep, KnowledgeEntry, Matchers, RootCause, Source};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a minimal entry; tests fill in the fields they care about.
#[allow(dead_code)] // Used across different integration test crates
pub fn entry(tool: &str, slug: &str, title: &str, category: Category) -> KnowledgeEntry {
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    KnowledgeEntry {
        tool: tool.to_string(),
        canonical_slug: slug.to_string(),
        title: title.to_string(),
        aliases: vec![],
        matchers: Matchers { regex: vec![] },
        category,
        summary: String::new(),
        root_causes: vec![],
        fix_steps: vec![],
        clarifying_questions: vec![],
        examples: vec![],
        created_at: created,
        updated_at: created,
    }
}

/// The canonical crash-loop entry from the end-to-end scenarios.
#[allow(dead_code)]
pub fn crashloop_entry() -> KnowledgeEntry {
    let mut e = entry(
        "kubernetes",
        "crashloopbackoff",
        "CrashLoopBackOff",
        Category::Runtime,
    );
    e.aliases = vec!["crash loop".to_string()];
    e.matchers.regex = vec!["crashloopbackoff".to_string()];
    e.summary = "A container repeatedly crashes after starting.".to_string();
    e.root_causes = vec![RootCause {
        name: "Application crashes on startup".to_string(),
        why: "The process exits before becoming ready".to_string(),
        confidence: 0.8,
        sources: vec![Source {
            url: "https://kubernetes.io/docs/tasks/debug/debug-application/debug-pods/"
                .to_string(),
            label: "Debug Pods".to_string(),
        }],
    }];
    e.fix_steps = vec![FixStep {
        step: "Inspect the container logs for the crashing pod".to_string(),
        commands: vec!["kubectl logs <pod> --previous".to_string()],
        sources: vec![],
    }];
    e.clarifying_questions =
        vec!["What do the logs of the previous container instance show?".to_string()];
    e
}

/// A hand-built corpus with known scoring behavior. Entries deliberately use
/// unboosted categories unless a test needs a boost.
#[fixture]
#[allow(dead_code)]
pub fn sample_corpus() -> Vec<KnowledgeEntry> {
    let mut volume = entry(
        "kubernetes",
        "volumemountfailed",
        "Volume Mount Failed",
        Category::Unknown,
    );
    volume.aliases = vec!["volume mount failed".to_string()];
    volume.matchers.regex = vec!["volume.*mount.*fail".to_string()];
    volume.summary = "A pod cannot start because a volume fails to mount.".to_string();

    let mut dns = entry(
        "kubernetes",
        "dnsresolutionfailed",
        "DNS Resolution Failed",
        Category::Unknown,
    );
    dns.aliases = vec!["no such host".to_string()];
    dns.matchers.regex = vec!["no such host".to_string()];
    dns.summary = "Pods cannot resolve service names through cluster DNS.".to_string();

    vec![crashloop_entry(), volume, dns]
}

/// A temporary live-store directory for provider tests. Each test gets its
/// own directory, removed automatically when the value drops.
#[allow(dead_code)]
pub struct TempStore {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)]
impl TempStore {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one tool partition as a `<tool>.json` document file.
    pub fn write_tool(&self, tool: &str, entries: &[KnowledgeEntry]) {
        let json = serde_json::to_string_pretty(entries).expect("entries serialize");
        std::fs::write(self.root.join(format!("{tool}.json")), json)
            .expect("Failed to write document file");
    }

    /// Writes raw bytes as a document file, for corruption tests.
    pub fn write_raw(&self, name: &str, contents: &str) {
        std::fs::write(self.root.join(name), contents).expect("Failed to write file");
    }
}
