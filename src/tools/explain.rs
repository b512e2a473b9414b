//! Explain handler: match pasted error text against the knowledge base and
//! assemble the full answer (causes, fixes, sources, follow-ups).

use rmcp::schemars;
use serde::{Deserialize, Serialize};

use crate::corpus::{FixStep, KnowledgeEntry, RootCause, Source};
use crate::error::Result;
use crate::matcher::Suggestion;
use crate::normalize::normalize;
use crate::provider::Submission;
use crate::server::ServerState;

/// Confidence below which the answer carries a clarifying question and the
/// ranked alternates.
const LOW_CONFIDENCE: f64 = 0.6;

const FALLBACK_QUESTION: &str = "Can you provide more context about when this error occurs?";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExplainRequest {
    /// Raw error text to analyze: pasted CLI output, log lines, or event
    /// messages. Normalization (lowercasing, ANSI stripping) happens here.
    pub text: String,
    /// Tool partition to match against (default: "kubernetes")
    #[serde(default)]
    pub tool: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub slug: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub tool: String,
    #[serde(rename = "match")]
    pub matched: MatchSummary,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub root_causes: Vec<RootCause>,
    pub fix_steps: Vec<FixStep>,
    /// Every source link across causes, steps, and examples, deduplicated by
    /// URL in first-seen order.
    pub sources: Vec<Source>,
    /// Present only when confidence is low and an entry matched.
    pub clarifying_question: Option<String>,
    /// Ranked alternates, included only when confidence is low.
    pub suggestions: Vec<Suggestion>,
}

/// Runs the full explain flow: normalize, match, audit, assemble. The
/// submission write is fire-and-forget; it can never fail the response.
pub async fn handle_explain(state: &ServerState, request: ExplainRequest) -> Result<String> {
    let tool = request.tool.as_deref().unwrap_or("kubernetes");
    let entries = state.provider.find_all(Some(tool)).await;

    let normalized = normalize(&request.text);
    let result = state.matcher.match_error(&normalized, &entries);

    if let Some(sink) = &state.sink {
        let sink = sink.clone();
        let submission = Submission::new(&request.text, &normalized, &result);
        tokio::spawn(async move { sink.record(submission).await });
    }

    let matched_entry = result
        .slug
        .as_deref()
        .and_then(|slug| entries.iter().find(|e| e.canonical_slug == slug));

    let low_confidence = result.confidence < LOW_CONFIDENCE;
    let clarifying_question = (low_confidence && matched_entry.is_some()).then(|| {
        matched_entry
            .and_then(|entry| entry.clarifying_questions.first().cloned())
            .unwrap_or_else(|| FALLBACK_QUESTION.to_string())
    });

    let response = ExplainResponse {
        tool: tool.to_string(),
        matched: MatchSummary {
            slug: result.slug.clone(),
            confidence: result.confidence,
        },
        title: matched_entry.map(|e| e.title.clone()),
        summary: matched_entry.map(|e| e.summary.clone()),
        root_causes: matched_entry.map(|e| e.root_causes.clone()).unwrap_or_default(),
        fix_steps: matched_entry.map(|e| e.fix_steps.clone()).unwrap_or_default(),
        sources: matched_entry.map(collect_sources).unwrap_or_default(),
        clarifying_question,
        suggestions: if low_confidence {
            result.suggestions
        } else {
            Vec::new()
        },
    };

    Ok(serde_json::to_string_pretty(&response)?)
}

/// Flattens source links from causes, steps, and examples, keeping the first
/// occurrence of each URL.
fn collect_sources(entry: &KnowledgeEntry) -> Vec<Source> {
    let mut seen = ahash::AHashSet::new();
    entry
        .root_causes
        .iter()
        .flat_map(|c| &c.sources)
        .chain(entry.fix_steps.iter().flat_map(|s| &s.sources))
        .chain(entry.examples.iter().flat_map(|e| &e.sources))
        .filter(|source| seen.insert(source.url.clone()))
        .cloned()
        .collect()
}
