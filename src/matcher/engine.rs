//! Multi-signal match scoring over the knowledge base.
//!
//! Given one normalized query and the candidate corpus, every entry is scored
//! independently as the sum of its signal scores (exact slug, regex matchers,
//! aliases, title, summary, root causes, domain vocabulary, category boost),
//! then ranked. The top score drives a step-table confidence estimate and the
//! leading entries become suggestions. Each signal that fires appends a
//! [`MatchDetail`] so callers can explain why an entry ranked where it did.

use ahash::AHashSet;
use regex::RegexBuilder;
use serde::Serialize;

use crate::corpus::{Category, KnowledgeEntry, RootCause};
use crate::normalize::{char_len, normalize, tokenize};

use super::config::MatcherConfig;

/// Domain vocabulary used for contextual matching. Queries sharing these
/// terms with an entry's fix steps get a small semantic bump.
const DOMAIN_KEYWORDS: &[&str] = &[
    "pod",
    "container",
    "deployment",
    "service",
    "node",
    "cluster",
    "image",
    "volume",
    "secret",
    "configmap",
    "namespace",
    "ingress",
    "kubelet",
    "api",
    "scheduler",
    "controller",
    "etcd",
    "proxy",
];

/// Which heuristic produced a match detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSignal {
    Exact,
    Regex,
    Alias,
    Title,
    Summary,
    Cause,
    Semantic,
}

/// One fired signal, kept for explainability.
#[derive(Debug, Clone, Serialize)]
pub struct MatchDetail {
    #[serde(rename = "type")]
    pub signal: MatchSignal,
    pub pattern: String,
    pub matched_text: String,
    pub score: f64,
}

/// A ranked alternate offered alongside the best match.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub slug: String,
    pub title: String,
    pub category: Category,
    pub score: f64,
}

/// Outcome of matching one query against the corpus. Computed fresh per
/// request, never stored except as an audit submission.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// Slug of the best-scoring entry, `None` for an empty query or corpus.
    pub slug: Option<String>,
    /// Calibrated estimate of match correctness, in [0, 0.99].
    pub confidence: f64,
    /// Total score of the best entry, rounded to 1 decimal.
    pub score: f64,
    /// Fired signals of the best entry.
    pub match_details: Vec<MatchDetail>,
    /// Up to 5 top-scoring entries.
    pub suggestions: Vec<Suggestion>,
}

impl MatchResult {
    fn empty() -> Self {
        Self {
            slug: None,
            confidence: 0.0,
            score: 0.0,
            match_details: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

struct Scored<'a> {
    entry: &'a KnowledgeEntry,
    total: f64,
    details: Vec<MatchDetail>,
}

/// The match-scoring engine. Holds only its weight table, so one instance is
/// safe to share across concurrent requests without locking.
#[derive(Debug, Clone)]
pub struct MatcherEngine {
    config: MatcherConfig,
}

impl MatcherEngine {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Engine with the reference weight table.
    pub fn with_defaults() -> Self {
        Self::new(MatcherConfig::default())
    }

    /// Matches normalized text against the corpus using weighted scoring.
    ///
    /// `normalized_text` must already have passed through
    /// [`normalize`](crate::normalize::normalize). An empty query returns the
    /// zero result without scoring anything. Ties keep corpus order (the sort
    /// is stable), so equal-scoring entries rank by insertion order.
    pub fn match_error(&self, normalized_text: &str, entries: &[KnowledgeEntry]) -> MatchResult {
        if normalized_text.trim().is_empty() {
            return MatchResult::empty();
        }

        let query_tokens = tokenize(normalized_text);
        let mut scored: Vec<Scored<'_>> = entries
            .iter()
            .map(|entry| self.score_entry(normalized_text, &query_tokens, entry))
            .collect();
        scored.sort_by(|a, b| b.total.total_cmp(&a.total));

        let suggestions = scored
            .iter()
            .take(5)
            .map(|s| Suggestion {
                slug: s.entry.canonical_slug.clone(),
                title: s.entry.title.clone(),
                category: s.entry.category,
                score: round1(s.total),
            })
            .collect();

        let top_score = scored.first().map_or(0.0, |s| s.total);
        let confidence = self.confidence(top_score, char_len(normalized_text));
        let top = (!scored.is_empty()).then(|| scored.swap_remove(0));

        MatchResult {
            slug: top.as_ref().map(|s| s.entry.canonical_slug.clone()),
            confidence,
            score: round1(top_score),
            match_details: top.map(|s| s.details).unwrap_or_default(),
            suggestions,
        }
    }

    fn score_entry<'a>(
        &self,
        text: &str,
        query_tokens: &[String],
        entry: &'a KnowledgeEntry,
    ) -> Scored<'a> {
        let mut details = Vec::new();
        let mut total = 0.0;

        if text == entry.canonical_slug {
            let score = self.config.exact_weight;
            details.push(MatchDetail {
                signal: MatchSignal::Exact,
                pattern: entry.canonical_slug.clone(),
                matched_text: text.to_string(),
                score,
            });
            total += score;
        }

        total += self.score_regex(text, &entry.matchers.regex, &mut details);
        total += self.score_aliases(text, query_tokens, &entry.aliases, &mut details);
        total += self.score_title(text, query_tokens, &entry.title, &mut details);
        total += self.score_summary(query_tokens, &entry.summary, &mut details);
        total += self.score_causes(query_tokens, &entry.root_causes, &mut details);
        total += self.score_semantic(query_tokens, entry, &mut details);

        let boost = self.config.boost_for(entry.category);
        if boost > 0.0 {
            total += boost;
            details.push(MatchDetail {
                signal: MatchSignal::Semantic,
                pattern: format!("category:{}", entry.category),
                matched_text: entry.category.to_string(),
                score: boost,
            });
        }

        if self.config.length_penalty && char_len(text) < 10 {
            total *= 0.8;
        }

        Scored {
            entry,
            total,
            details,
        }
    }

    /// Scores each distinct matcher pattern found in the query, weighted by
    /// how much of the query the match covers. Patterns that fail to compile
    /// are skipped; they never abort scoring.
    fn score_regex(&self, text: &str, patterns: &[String], details: &mut Vec<MatchDetail>) -> f64 {
        let text_len = char_len(text) as f64;
        let mut matched_patterns = AHashSet::new();
        let mut score = 0.0;

        for pattern in patterns {
            if matched_patterns.contains(pattern.as_str()) {
                continue;
            }
            let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
                Ok(regex) => regex,
                Err(e) => {
                    tracing::debug!("Skipping unparsable matcher pattern '{}': {}", pattern, e);
                    continue;
                }
            };

            if let Some(found) = regex.find(text) {
                matched_patterns.insert(pattern.as_str());
                let match_score =
                    self.config.regex_weight * (1.0 + char_len(found.as_str()) as f64 / text_len);
                score += match_score;
                details.push(MatchDetail {
                    signal: MatchSignal::Regex,
                    pattern: pattern.clone(),
                    matched_text: found.as_str().to_string(),
                    score: round1(match_score),
                });
            }
        }

        score
    }

    /// Containment in either direction scores by alias coverage of the
    /// query; otherwise partial token overlap scores at half weight.
    fn score_aliases(
        &self,
        text: &str,
        query_tokens: &[String],
        aliases: &[String],
        details: &mut Vec<MatchDetail>,
    ) -> f64 {
        let text_len = char_len(text) as f64;
        let mut score = 0.0;

        for alias in aliases {
            let normalized_alias = normalize(alias);
            if normalized_alias.is_empty() {
                continue;
            }

            if text.contains(&normalized_alias) || normalized_alias.contains(text) {
                let match_score =
                    self.config.alias_weight * (char_len(&normalized_alias) as f64 / text_len);
                score += match_score;
                details.push(MatchDetail {
                    signal: MatchSignal::Alias,
                    pattern: alias.clone(),
                    matched_text: normalized_alias,
                    score: round1(match_score),
                });
                continue;
            }

            let alias_tokens = tokenize(&normalized_alias);
            let overlap = bidirectional_overlap(query_tokens, &alias_tokens);
            if !overlap.is_empty() {
                let denominator = query_tokens.len().max(alias_tokens.len()) as f64;
                let match_score =
                    self.config.alias_weight * 0.5 * (overlap.len() as f64 / denominator);
                score += match_score;
                details.push(MatchDetail {
                    signal: MatchSignal::Alias,
                    pattern: alias.clone(),
                    matched_text: overlap.join(" "),
                    score: round1(match_score),
                });
            }
        }

        score
    }

    fn score_title(
        &self,
        text: &str,
        query_tokens: &[String],
        title: &str,
        details: &mut Vec<MatchDetail>,
    ) -> f64 {
        let normalized_title = normalize(title);
        if normalized_title.is_empty() {
            return 0.0;
        }

        if text.contains(&normalized_title) || normalized_title.contains(text) {
            let score = self.config.title_weight;
            details.push(MatchDetail {
                signal: MatchSignal::Title,
                pattern: title.to_string(),
                matched_text: title.to_string(),
                score,
            });
            return score;
        }

        let title_tokens = tokenize(&normalized_title);
        if title_tokens.is_empty() {
            return 0.0;
        }
        let overlap = bidirectional_overlap(query_tokens, &title_tokens);
        if overlap.is_empty() {
            return 0.0;
        }

        let score =
            self.config.title_weight * 0.7 * (overlap.len() as f64 / title_tokens.len() as f64);
        details.push(MatchDetail {
            signal: MatchSignal::Title,
            pattern: title.to_string(),
            matched_text: overlap.join(" "),
            score: round1(score),
        });
        score
    }

    /// Overlap ratio over the query tokens; only tokens longer than 3
    /// characters count against the summary.
    fn score_summary(
        &self,
        query_tokens: &[String],
        summary: &str,
        details: &mut Vec<MatchDetail>,
    ) -> f64 {
        let summary_tokens = tokenize(&normalize(summary));
        let matched = containment_overlap(query_tokens, &summary_tokens);
        if matched.is_empty() {
            return 0.0;
        }

        let score = self.config.summary_weight * (matched.len() as f64 / query_tokens.len() as f64);
        details.push(MatchDetail {
            signal: MatchSignal::Summary,
            pattern: truncate_chars(summary, 50),
            matched_text: matched.join(" "),
            score: round1(score),
        });
        score
    }

    /// First three causes only; each overlap ratio is weighted by that
    /// cause's own prior confidence.
    fn score_causes(
        &self,
        query_tokens: &[String],
        causes: &[RootCause],
        details: &mut Vec<MatchDetail>,
    ) -> f64 {
        let mut score = 0.0;

        for cause in causes.iter().take(3) {
            let cause_text = normalize(&format!("{} {}", cause.name, cause.why));
            let cause_tokens = tokenize(&cause_text);
            let matched = containment_overlap(query_tokens, &cause_tokens);
            if matched.is_empty() {
                continue;
            }

            let match_score = self.config.cause_weight
                * (matched.len() as f64 / query_tokens.len() as f64)
                * cause.confidence;
            score += match_score;
            details.push(MatchDetail {
                signal: MatchSignal::Cause,
                pattern: cause.name.clone(),
                matched_text: matched.join(" "),
                score: round1(match_score),
            });
        }

        score
    }

    /// Domain-vocabulary intersection between the query and the entry's fix
    /// steps, capped at the first 5 vocabulary tokens the steps mention.
    fn score_semantic(
        &self,
        query_tokens: &[String],
        entry: &KnowledgeEntry,
        details: &mut Vec<MatchDetail>,
    ) -> f64 {
        let context_keywords: Vec<String> = entry
            .fix_steps
            .iter()
            .flat_map(|step| tokenize(&step.step))
            .filter(|token| DOMAIN_KEYWORDS.contains(&token.as_str()))
            .take(5)
            .collect();

        let matched: Vec<&str> = query_tokens
            .iter()
            .filter(|token| context_keywords.iter().any(|kw| kw == *token))
            .map(String::as_str)
            .collect();
        if matched.is_empty() {
            return 0.0;
        }

        let score = self.config.semantic_weight * matched.len() as f64;
        details.push(MatchDetail {
            signal: MatchSignal::Semantic,
            pattern: "domain-context".to_string(),
            matched_text: matched.join(" "),
            score: round1(score),
        });
        score
    }

    /// Step-table calibration of the top score, adjusted down for very short
    /// queries and slightly for very long ones, capped at 0.99.
    fn confidence(&self, score: f64, text_chars: usize) -> f64 {
        let base = if score >= 80.0 {
            0.95
        } else if score >= 60.0 {
            0.85
        } else if score >= 40.0 {
            0.75
        } else if score >= 25.0 {
            0.65
        } else if score >= 15.0 {
            0.5
        } else if score >= 8.0 {
            0.35
        } else {
            0.1
        };

        let adjusted: f64 = if text_chars < 20 {
            base * 0.8
        } else if text_chars > 100 {
            base * 0.9
        } else {
            base
        };

        adjusted.min(0.99)
    }
}

/// Query tokens sharing a substring relation with any other-side token, in
/// either direction.
fn bidirectional_overlap<'a>(query_tokens: &'a [String], other: &[String]) -> Vec<&'a str> {
    query_tokens
        .iter()
        .filter(|token| {
            other
                .iter()
                .any(|o| o.contains(token.as_str()) || token.contains(o.as_str()))
        })
        .map(String::as_str)
        .collect()
}

/// Query tokens longer than 3 characters that appear inside any other-side
/// token. Used for prose fields where short tokens are noise.
fn containment_overlap<'a>(query_tokens: &'a [String], other: &[String]) -> Vec<&'a str> {
    query_tokens
        .iter()
        .filter(|token| char_len(token) > 3 && other.iter().any(|o| o.contains(token.as_str())))
        .map(String::as_str)
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    let mut truncated: String = text.chars().take(max).collect();
    if char_len(text) > max {
        truncated.push_str("...");
    }
    truncated
}

/// External consumers see scores at 1-decimal precision; internal
/// accumulation keeps full precision.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{FixStep, Matchers};
    use assert2::check;
    use chrono::Utc;
    use rstest::rstest;

    fn entry(slug: &str, title: &str, category: Category) -> KnowledgeEntry {
        KnowledgeEntry {
            tool: "kubernetes".to_string(),
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
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn engine() -> MatcherEngine {
        MatcherEngine::with_defaults()
    }

    #[test]
    fn empty_query_short_circuits() {
        let entries = vec![entry("oomkilled", "OOM Killed", Category::Runtime)];
        let result = engine().match_error("", &entries);

        check!(result.slug.is_none());
        check!(result.confidence == 0.0);
        check!(result.score == 0.0);
        check!(result.match_details.is_empty());
        check!(result.suggestions.is_empty());
    }

    #[test]
    fn exact_slug_match_wins() {
        let entries = vec![
            entry("imagepullbackoff", "Image Pull BackOff", Category::Runtime),
            entry("oomkilled", "OOM Killed", Category::Runtime),
        ];
        let result = engine().match_error("oomkilled", &entries);

        check!(result.slug.as_deref() == Some("oomkilled"));
        check!(
            result
                .match_details
                .iter()
                .any(|d| d.signal == MatchSignal::Exact)
        );
    }

    #[test]
    fn regex_score_scales_with_match_coverage() {
        let mut target = entry("crashloopbackoff", "CrashLoopBackOff", Category::Runtime);
        target.matchers.regex = vec!["crashloopbackoff".to_string()];
        let entries = vec![target];

        let result = engine().match_error("my pod is in crashloopbackoff state", &entries);

        let detail = result
            .match_details
            .iter()
            .find(|d| d.signal == MatchSignal::Regex)
            .expect("regex signal fires");
        // 25 * (1 + 16/35)
        check!((detail.score - 36.4).abs() < 0.05);
    }

    #[test]
    fn invalid_regex_is_skipped_without_aborting() {
        let mut target = entry("crashloopbackoff", "CrashLoopBackOff", Category::Runtime);
        target.matchers.regex = vec!["[unclosed".to_string(), "crashloopbackoff".to_string()];
        let entries = vec![target];

        let result = engine().match_error("pod in crashloopbackoff", &entries);

        check!(result.slug.as_deref() == Some("crashloopbackoff"));
        let regex_details = result
            .match_details
            .iter()
            .filter(|d| d.signal == MatchSignal::Regex)
            .count();
        check!(regex_details == 1);
    }

    #[test]
    fn alias_containment_beats_token_overlap() {
        let mut with_alias = entry("imagepullbackoff", "Image Pull BackOff", Category::Runtime);
        with_alias.aliases = vec!["image pull error".to_string()];
        let entries = vec![with_alias];

        let contained = engine().match_error("got an image pull error today", &entries);
        let overlapped = engine().match_error("pull failing on my image somehow again", &entries);

        check!(contained.score > overlapped.score);
    }

    #[test]
    fn category_boost_is_added_and_explained() {
        let entries = vec![entry("oomkilled", "OOM Killed", Category::Runtime)];
        let result = engine().match_error("some unrelated words here", &entries);

        check!(
            result
                .match_details
                .iter()
                .any(|d| d.pattern == "category:runtime" && d.score == 15.0)
        );
    }

    #[test]
    fn unlisted_category_gets_no_boost() {
        let entries = vec![entry("mystery", "Mystery", Category::Unknown)];
        let result = engine().match_error("some unrelated words here", &entries);

        check!(result.score == 0.0);
    }

    #[test]
    fn short_queries_are_penalized() {
        let entries = vec![entry("oomkilled", "OOM Killed", Category::Runtime)];
        // Both queries score only the category boost (15); the first is under
        // 10 characters so the penalty applies.
        let short = engine().match_error("zzz error", &entries);
        let long = engine().match_error("completely unrelated words", &entries);

        check!(short.score == 12.0);
        check!(long.score == 15.0);
    }

    #[test]
    fn semantic_signal_counts_domain_vocabulary() {
        let mut target = entry("oomkilled", "OOM Killed", Category::Unknown);
        target.fix_steps = vec![FixStep {
            step: "Inspect the pod and container limits on the node".to_string(),
            commands: vec![],
            sources: vec![],
        }];
        let entries = vec![target];

        let result = engine().match_error("the pod container keeps dying", &entries);

        let detail = result
            .match_details
            .iter()
            .find(|d| d.pattern == "domain-context")
            .expect("semantic signal fires");
        // "pod" and "container" both match: 5 * 2
        check!(detail.score == 10.0);
    }

    #[rstest]
    #[case(85.0, 0.95)]
    #[case(65.0, 0.85)]
    #[case(45.0, 0.75)]
    #[case(30.0, 0.65)]
    #[case(17.0, 0.5)]
    #[case(9.0, 0.35)]
    #[case(3.0, 0.1)]
    fn confidence_steps(#[case] score: f64, #[case] expected: f64) {
        // 20..=100 chars avoids both length adjustments.
        let text_chars = 40;
        check!(engine().confidence(score, text_chars) == expected);
    }

    #[test]
    fn confidence_is_monotonic_in_score() {
        let e = engine();
        let scores = [0.0, 5.0, 10.0, 20.0, 30.0, 50.0, 70.0, 90.0];
        for pair in scores.windows(2) {
            check!(e.confidence(pair[0], 40) <= e.confidence(pair[1], 40));
        }
    }

    #[rstest]
    #[case(10, 0.76)] // short query: 0.95 * 0.8
    #[case(40, 0.95)]
    #[case(150, 0.855)] // long query: 0.95 * 0.9
    fn confidence_adjusts_for_query_length(#[case] chars: usize, #[case] expected: f64) {
        check!((engine().confidence(85.0, chars) - expected).abs() < 1e-9);
    }

    #[test]
    fn suggestions_cap_at_five_and_rank_by_score() {
        let entries: Vec<KnowledgeEntry> = (0..8)
            .map(|i| {
                entry(
                    &format!("error-{i}"),
                    &format!("Error {i}"),
                    if i == 3 {
                        Category::Runtime
                    } else {
                        Category::Unknown
                    },
                )
            })
            .collect();

        let result = engine().match_error("something entirely different", &entries);

        check!(result.suggestions.len() == 5);
        // The boosted runtime entry leads; the rest keep corpus order.
        check!(result.suggestions[0].slug == "error-3");
        check!(result.suggestions[1].slug == "error-0");
    }

    #[test]
    fn ties_keep_corpus_order() {
        let entries = vec![
            entry("first", "First", Category::Unknown),
            entry("second", "Second", Category::Unknown),
        ];
        let result = engine().match_error("nothing in common with either", &entries);

        check!(result.slug.as_deref() == Some("first"));
    }

    #[test]
    fn empty_corpus_yields_no_slug() {
        let result = engine().match_error("anything at all goes here", &[]);

        check!(result.slug.is_none());
        check!(result.score == 0.0);
        check!(result.confidence == 0.1);
        check!(result.suggestions.is_empty());
    }

    #[test]
    fn custom_weights_are_respected() {
        let config = MatcherConfig {
            title_weight: 100.0,
            ..MatcherConfig::default()
        };
        let entries = vec![entry("oomkilled", "OOM Killed", Category::Unknown)];

        let result = MatcherEngine::new(config).match_error("oom killed", &entries);

        let title = result
            .match_details
            .iter()
            .find(|d| d.signal == MatchSignal::Title)
            .expect("title signal fires");
        check!(title.score == 100.0);
    }
}
