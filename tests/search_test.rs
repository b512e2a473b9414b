mod common;

use assert2::check;
use common::{crashloop_entry, entry};
use errdoc_mcp::corpus::{Category, KnowledgeEntry, static_entries};
use errdoc_mcp::search::{MatchType, SearchEngine};

/// Empty queries return an empty response without scanning the corpus.
#[test]
fn empty_query_is_an_empty_result_set() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(None);

    let response = engine.search("", &entries, None, 1, 20);

    check!(response.results.is_empty());
    check!(response.total == 0);
}

/// A slug query finds its entry through the exact pass, ranked first.
#[test]
fn slug_query_ranks_exact_match_first() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(Some("kubernetes"));

    let response = engine.search("podpending", &entries, None, 1, 20);

    check!(!response.results.is_empty());
    check!(response.results[0].entry.canonical_slug == "podpending");
    check!(response.results[0].match_type == MatchType::Exact);
}

/// The same slug reached through two passes appears once with the higher
/// score and that pass's match type.
#[test]
fn duplicate_passes_collapse_to_the_best() {
    let engine = SearchEngine::with_defaults();
    let entries = vec![crashloop_entry()];

    let response = engine.search("crash loop pod restarts", &entries, None, 1, 20);

    let hits: Vec<_> = response
        .results
        .iter()
        .filter(|r| r.entry.canonical_slug == "crashloopbackoff")
        .collect();
    check!(hits.len() == 1);
    check!(hits[0].match_type == MatchType::Alias);
}

/// Category filtering is exact and drives the facet list.
#[test]
fn category_filter_narrows_results() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(None);

    let unfiltered = engine.search("docker daemon error", &entries, None, 1, 20);
    let auth_only = engine.search("docker daemon error", &entries, Some(Category::Auth), 1, 20);

    check!(auth_only.total <= unfiltered.total);
    check!(
        auth_only
            .results
            .iter()
            .all(|r| r.entry.category == Category::Auth)
    );
    check!(auth_only.categories.iter().all(|c| *c == Category::Auth));
}

/// Pagination slices the filtered set without changing the total, and pages
/// never overlap.
#[test]
fn pagination_is_a_window_over_the_ranked_set() {
    let engine = SearchEngine::with_defaults();
    let entries: Vec<KnowledgeEntry> = (0..25)
        .map(|i| {
            let mut e = entry(
                "kubernetes",
                &format!("timeout-{i}"),
                &format!("Timeout {i}"),
                Category::Unknown,
            );
            e.summary = "The upstream request timed out waiting for a response.".to_string();
            e
        })
        .collect();

    let page_one = engine.search("request timed out", &entries, None, 1, 10);
    let page_two = engine.search("request timed out", &entries, None, 2, 10);
    let page_three = engine.search("request timed out", &entries, None, 3, 10);

    check!(page_one.total == 25);
    check!(page_two.total == 25);
    check!(page_one.results.len() == 10);
    check!(page_two.results.len() == 10);
    check!(page_three.results.len() == 5);
    check!(page_two.results[0].entry.canonical_slug == "timeout-10");
    check!(page_two.results[9].entry.canonical_slug == "timeout-19");

    let first_page_slugs: Vec<_> = page_one
        .results
        .iter()
        .map(|r| r.entry.canonical_slug.clone())
        .collect();
    check!(
        page_two
            .results
            .iter()
            .all(|r| !first_page_slugs.contains(&r.entry.canonical_slug))
    );
}

/// Fuzzy matching needs more than a marginal overlap to include an entry.
#[test]
fn marginal_fuzzy_overlap_is_excluded() {
    let engine = SearchEngine::with_defaults();
    let mut e = entry(
        "kubernetes",
        "quotaexceeded",
        "Namespace Limits",
        Category::Unknown,
    );
    e.summary = "The resource quota for the project has been exhausted.".to_string();
    let entries = vec![e];

    // Five words, one overlapping, none touching the title:
    // floor(40 * 1/5) = 8, under the cutoff.
    let response = engine.search("zz yy xx ww quota", &entries, None, 1, 20);

    check!(response.results.is_empty());
}

/// Suggestions over the shipped corpus: aliases and titles, capped at 10.
#[test]
fn suggestions_come_from_aliases_and_titles() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(None);

    let suggestions = engine.suggestions("image pull", &entries);

    check!(!suggestions.is_empty());
    check!(suggestions.len() <= 10);
    check!(suggestions.iter().any(|s| s.contains("image pull")));
}

/// Sub-2-character input gets the static popular list.
#[test]
fn tiny_input_gets_popular_queries() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(None);

    let suggestions = engine.suggestions("x", &entries);

    check!(suggestions == errdoc_mcp::search::POPULAR_QUERIES);
}

/// Search across every partition surfaces entries from both shipped tools.
#[test]
fn search_spans_tool_partitions() {
    let engine = SearchEngine::with_defaults();
    let entries = static_entries(None);

    let response = engine.search("permission denied docker socket", &entries, None, 1, 20);

    check!(
        response
            .results
            .iter()
            .any(|r| r.entry.tool == "docker" && r.entry.canonical_slug == "permissiondenied-socket")
    );
}
