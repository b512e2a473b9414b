//! Full-text search and ranking over the knowledge base.
//!
//! Unlike the match scorer, which picks a single best answer for one error
//! message, this engine powers the browse experience: four independent match
//! passes (exact slug, alias, regex, fuzzy content) feed a deduplicated,
//! category-filterable, paginated ranked list. The two engines keep separate
//! weight tables on purpose; their rankings are tuned independently.

use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use regex::RegexBuilder;
use serde::Serialize;

use crate::corpus::{Category, KnowledgeEntry};
use crate::normalize::{char_len, normalize};

/// Score table for the search engine. The category table is fractional:
/// each weight scales `category_base`.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub exact_score: f64,
    pub alias_score: f64,
    pub regex_score: f64,
    pub fuzzy_score: f64,
    /// Added when an alias equals the query outright.
    pub exact_alias_bonus: f64,
    pub title_boost: f64,
    pub summary_boost: f64,
    pub category_base: f64,
    pub category_weights: AHashMap<Category, f64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exact_score: 100.0,
            alias_score: 80.0,
            regex_score: 60.0,
            fuzzy_score: 40.0,
            exact_alias_bonus: 20.0,
            title_boost: 15.0,
            summary_boost: 10.0,
            category_base: 20.0,
            category_weights: AHashMap::from_iter([
                (Category::Runtime, 1.0),
                (Category::Network, 0.8),
                (Category::Auth, 0.6),
                (Category::Storage, 0.6),
                (Category::Config, 0.4),
                (Category::Scheduler, 0.4),
                (Category::Cluster, 0.4),
            ]),
        }
    }
}

/// Which pass produced a search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Alias,
    Regex,
    Fuzzy,
}

/// One ranked hit. Deduplicated by slug before ranking; the highest-scoring
/// pass wins the record.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub entry: KnowledgeEntry,
    pub score: f64,
    pub match_type: MatchType,
    pub matched_text: String,
}

/// One page of ranked results plus facets and timing.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// Full filtered count, independent of pagination.
    pub total: usize,
    pub query: String,
    pub page: usize,
    pub page_size: usize,
    /// Distinct categories across the filtered set, in first-seen order.
    pub categories: Vec<Category>,
    pub execution_time_ms: u64,
}

/// The search/ranking engine. Stateless beyond its score table; safe for
/// concurrent use.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Engine with the reference score table.
    pub fn with_defaults() -> Self {
        Self::new(SearchConfig::default())
    }

    /// Runs all four match passes over the corpus, dedups by slug, filters,
    /// ranks, and paginates. Ties keep pass order (exact before alias before
    /// regex before fuzzy, corpus order within a pass) thanks to the stable
    /// sort. An empty query returns an empty response immediately.
    pub fn search(
        &self,
        query: &str,
        entries: &[KnowledgeEntry],
        category: Option<Category>,
        page: usize,
        page_size: usize,
    ) -> SearchResponse {
        let start = Instant::now();
        let page = page.max(1);
        let normalized = normalize(query);

        if normalized.is_empty() {
            return SearchResponse {
                results: Vec::new(),
                total: 0,
                query: query.to_string(),
                page,
                page_size,
                categories: Vec::new(),
                execution_time_ms: elapsed_ms(start),
            };
        }

        let mut results = Vec::new();
        results.extend(self.find_exact(&normalized, entries));
        results.extend(self.find_aliases(&normalized, entries));
        results.extend(self.find_regex(&normalized, entries));
        results.extend(self.find_fuzzy(&normalized, entries));

        let unique = dedupe_by_slug(results);
        let mut filtered: Vec<SearchResult> = match category {
            Some(wanted) => unique
                .into_iter()
                .filter(|r| r.entry.category == wanted)
                .collect(),
            None => unique,
        };
        filtered.sort_by(|a, b| b.score.total_cmp(&a.score));

        let total = filtered.len();
        let categories = distinct_categories(&filtered);
        let results = filtered
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect();

        SearchResponse {
            results,
            total,
            query: query.to_string(),
            page,
            page_size,
            categories,
            execution_time_ms: elapsed_ms(start),
        }
    }

    fn category_boost(&self, entry: &KnowledgeEntry) -> f64 {
        self.config.category_base
            * self
                .config
                .category_weights
                .get(&entry.category)
                .copied()
                .unwrap_or(0.0)
    }

    fn find_exact(&self, query: &str, entries: &[KnowledgeEntry]) -> Vec<SearchResult> {
        entries
            .iter()
            .filter(|entry| entry.canonical_slug == query)
            .map(|entry| SearchResult {
                entry: entry.clone(),
                score: self.config.exact_score + self.category_boost(entry),
                match_type: MatchType::Exact,
                matched_text: entry.canonical_slug.clone(),
            })
            .collect()
    }

    /// First qualifying alias per entry only; an alias qualifies when it
    /// contains the query or the query contains it.
    fn find_aliases(&self, query: &str, entries: &[KnowledgeEntry]) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for entry in entries {
            for alias in &entry.aliases {
                let normalized_alias = normalize(alias);
                if normalized_alias.is_empty() {
                    continue;
                }
                if !normalized_alias.contains(query) && !query.contains(&normalized_alias) {
                    continue;
                }

                let mut score = self.config.alias_score;
                if normalized_alias == query {
                    score += self.config.exact_alias_bonus;
                }
                if normalize(&entry.title).contains(query) {
                    score += self.config.title_boost;
                }

                results.push(SearchResult {
                    entry: entry.clone(),
                    score: score + self.category_boost(entry),
                    match_type: MatchType::Alias,
                    matched_text: alias.clone(),
                });
                break;
            }
        }

        results
    }

    /// First qualifying matcher pattern per entry only. Unparsable patterns
    /// are skipped and never abort the batch.
    fn find_regex(&self, query: &str, entries: &[KnowledgeEntry]) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for entry in entries {
            for pattern in &entry.matchers.regex {
                let regex = match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => regex,
                    Err(e) => {
                        tracing::debug!("Skipping unparsable matcher pattern '{}': {}", pattern, e);
                        continue;
                    }
                };
                if !regex.is_match(query) {
                    continue;
                }

                let mut score = self.config.regex_score;
                if normalize(&entry.summary).contains(query) {
                    score += self.config.summary_boost;
                }

                results.push(SearchResult {
                    entry: entry.clone(),
                    score: score + self.category_boost(entry),
                    match_type: MatchType::Regex,
                    matched_text: pattern.clone(),
                });
                break;
            }
        }

        results
    }

    /// Multi-word overlap against the entry's concatenated text. Words of 2
    /// characters or fewer never count. Included only when the pre-boost
    /// score clears 10, so a lone weak overlap stays out of the results.
    fn find_fuzzy(&self, query: &str, entries: &[KnowledgeEntry]) -> Vec<SearchResult> {
        let query_words: Vec<&str> = query.split_whitespace().collect();
        if query_words.is_empty() {
            return Vec::new();
        }
        let mut results = Vec::new();

        for entry in entries {
            let searchable = searchable_text(entry);

            let match_count = query_words
                .iter()
                .filter(|word| char_len(word) > 2 && searchable.contains(**word))
                .count();
            if match_count == 0 {
                continue;
            }

            let match_ratio = match_count as f64 / query_words.len() as f64;
            let mut score = (self.config.fuzzy_score * match_ratio).floor();

            let normalized_title = normalize(&entry.title);
            let title_words: Vec<&str> = normalized_title.split_whitespace().collect();
            if query_words.iter().any(|word| {
                title_words
                    .iter()
                    .any(|tw| tw.contains(word) || word.contains(tw))
            }) {
                score += self.config.title_boost;
            }

            if score > 10.0 {
                results.push(SearchResult {
                    entry: entry.clone(),
                    score: score + self.category_boost(entry),
                    match_type: MatchType::Fuzzy,
                    matched_text: query_words
                        .iter()
                        .filter(|word| searchable.contains(**word))
                        .copied()
                        .collect::<Vec<_>>()
                        .join(" "),
                });
            }
        }

        results
    }
}

/// Normalized concatenation of every prose field the fuzzy pass scans.
fn searchable_text(entry: &KnowledgeEntry) -> String {
    let mut parts = vec![entry.title.clone(), entry.summary.clone()];
    parts.extend(
        entry
            .root_causes
            .iter()
            .map(|c| format!("{} {}", c.name, c.why)),
    );
    parts.extend(entry.fix_steps.iter().map(|s| s.step.clone()));
    parts.extend(
        entry
            .examples
            .iter()
            .map(|e| format!("{} {}", e.name, e.symptom)),
    );
    normalize(&parts.join(" "))
}

/// Keeps the first occurrence of each slug, but a later pass with a strictly
/// higher score takes over that record's score, match type, and matched text.
fn dedupe_by_slug(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut position: AHashMap<String, usize> = AHashMap::new();
    let mut unique: Vec<SearchResult> = Vec::new();

    for result in results {
        match position.get(&result.entry.canonical_slug) {
            None => {
                position.insert(result.entry.canonical_slug.clone(), unique.len());
                unique.push(result);
            }
            Some(&index) => {
                if result.score > unique[index].score {
                    unique[index].score = result.score;
                    unique[index].match_type = result.match_type;
                    unique[index].matched_text = result.matched_text;
                }
            }
        }
    }

    unique
}

fn distinct_categories(results: &[SearchResult]) -> Vec<Category> {
    let mut seen = AHashSet::new();
    results
        .iter()
        .map(|r| r.entry.category)
        .filter(|category| seen.insert(*category))
        .collect()
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
