//! Match-scoring engine configuration.

use ahash::AHashMap;

use crate::corpus::Category;

/// Weight table for the match-scoring engine. Constructed once and injected
/// into [`MatcherEngine::new`](super::MatcherEngine::new); tests inject
/// custom tables to isolate individual signals.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Flat score when the query equals a canonical slug verbatim.
    pub exact_weight: f64,
    /// Base score per distinct matcher pattern found in the query, scaled by
    /// how much of the query the match covers.
    pub regex_weight: f64,
    /// Base score for alias containment; halved for partial token overlap.
    pub alias_weight: f64,
    /// Flat score for title containment; scaled by 0.7 for token overlap.
    pub title_weight: f64,
    /// Score for summary token overlap, scaled by overlap ratio.
    pub summary_weight: f64,
    /// Score for root-cause token overlap, weighted by each cause's own
    /// prior confidence.
    pub cause_weight: f64,
    /// Score per domain-vocabulary token shared between query and fix steps.
    pub semantic_weight: f64,
    /// Additive bonus per category, reflecting historical prior likelihood.
    /// Categories absent from the table get no boost.
    pub category_boost: AHashMap<Category, f64>,
    /// Multiply the total by 0.8 for queries under 10 characters.
    pub length_penalty: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            exact_weight: 50.0,
            regex_weight: 25.0,
            alias_weight: 20.0,
            title_weight: 15.0,
            summary_weight: 10.0,
            cause_weight: 8.0,
            semantic_weight: 5.0,
            category_boost: AHashMap::from_iter([
                (Category::Runtime, 15.0),
                (Category::Network, 12.0),
                (Category::Auth, 10.0),
                (Category::Storage, 10.0),
                (Category::Config, 8.0),
                (Category::Scheduler, 8.0),
                (Category::Cluster, 8.0),
            ]),
            length_penalty: true,
        }
    }
}

impl MatcherConfig {
    /// Boost for `category`, 0 when the category is not in the table.
    pub(crate) fn boost_for(&self, category: Category) -> f64 {
        self.category_boost.get(&category).copied().unwrap_or(0.0)
    }
}
