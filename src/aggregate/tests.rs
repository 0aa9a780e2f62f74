use super::*;
use crate::types::{IndexedContentItem, RawResultItem};
use chrono::Utc;

fn search_result(query: &str) -> SearchResult {
    SearchResult::new(query, vec![], format!("summary of {}", query))
}

fn scored(id: &str, query: &str, url: &str, score: Option<f64>) -> ScoredMatch {
    let item = RawResultItem {
        title: format!("title {}", id),
        url: url.to_string(),
        snippet: format!("snippet {}", id),
    };
    ScoredMatch {
        key: id.to_string(),
        value: IndexedContentItem::from_result_item(id.to_string(), &item, query, "ignored"),
        score,
    }
}

fn group(query: &str, items: &[(&str, f64)]) -> AggregatedGroup {
    AggregatedGroup {
        query: query.to_string(),
        results: items
            .iter()
            .map(|(url, relevance)| AggregatedItem {
                title: format!("title {}", url),
                url: url.to_string(),
                snippet: String::new(),
                relevance_score: *relevance,
            })
            .collect(),
        summary: String::new(),
        timestamp: Utc::now(),
    }
}

#[test]
fn test_relevance_mapping() {
    assert!((relevance_score(Some(0.73)) - 7.3).abs() < 1e-9);
    assert_eq!(relevance_score(Some(1.4)), 10.0);
    assert_eq!(relevance_score(None), 5.0);
}

#[test]
fn test_relevance_clamps_negative_and_nan() {
    assert_eq!(relevance_score(Some(-0.4)), 0.0);
    assert_eq!(relevance_score(Some(f64::NAN)), 5.0);
    assert_eq!(relevance_score(Some(0.0)), 0.0);
}

#[test]
fn test_aggregate_groups_by_query_and_keeps_summary() {
    let original = vec![search_result("q1"), search_result("q2")];
    let matches = vec![
        scored("a", "q2", "http://a", Some(0.9)),
        scored("b", "q1", "http://b", Some(0.8)),
        scored("c", "q2", "http://c", None),
    ];

    let groups = aggregate("topic", &original, &matches);

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].query, "q2");
    assert_eq!(groups[0].summary, "summary of q2");
    assert_eq!(groups[0].timestamp, original[1].timestamp);
    assert_eq!(groups[0].results.len(), 2);
    assert_eq!(groups[0].results[0].url, "http://a");
    assert_eq!(groups[0].results[0].title, "title a");
    assert_eq!(groups[0].results[0].snippet, "snippet a");
    assert!((groups[0].results[0].relevance_score - 9.0).abs() < 1e-9);
    assert_eq!(groups[0].results[1].relevance_score, 5.0);
    assert_eq!(groups[1].query, "q1");
}

#[test]
fn test_queries_without_matches_are_dropped() {
    let original = vec![search_result("q1"), search_result("q2"), search_result("q3")];
    let matches = vec![scored("a", "q3", "http://a", Some(0.5))];

    let groups = aggregate("topic", &original, &matches);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].query, "q3");
}

#[test]
fn test_orphan_matches_are_ignored() {
    let original = vec![search_result("q1")];
    let matches = vec![
        scored("a", "unknown", "http://a", Some(0.5)),
        scored("b", "q1", "http://b", Some(0.5)),
    ];

    let groups = aggregate("topic", &original, &matches);

    assert_eq!(groups.len(), 1);
    assert!(groups.iter().all(|g| original.iter().any(|r| r.query == g.query)));
    assert_eq!(groups[0].results.len(), 1);
}

#[test]
fn test_collect_sources_first_seen_wins() {
    let groups = vec![
        group("q1", &[("http://a", 6.0)]),
        group("q2", &[("http://a", 9.0), ("http://b", 7.0)]),
    ];

    let sources = collect_sources(&groups, MAX_TOP_SOURCES);

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].url, "http://b");
    assert_eq!(sources[1].url, "http://a");
    assert_eq!(sources[1].relevance, 6.0);
}

#[test]
fn test_collect_sources_caps_at_fifteen_with_stable_ties() {
    let items: Vec<(String, f64)> = (0..20)
        .map(|i| (format!("http://s{}", i), (i % 10 + 1) as f64))
        .collect();
    let refs: Vec<(&str, f64)> = items.iter().map(|(u, r)| (u.as_str(), *r)).collect();
    let groups = vec![group("q", &refs[..10]), group("q2", &refs[10..])];

    let sources = collect_sources(&groups, 50);

    assert_eq!(sources.len(), 15);
    assert!(sources.windows(2).all(|w| w[0].relevance >= w[1].relevance));
    // s9 与 s19 相关度相同，保持原始顺序
    assert_eq!(sources[0].url, "http://s9");
    assert_eq!(sources[1].url, "http://s19");
    let urls: HashSet<&str> = sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls.len(), 15);
}

#[test]
fn test_collect_sources_respects_smaller_limit() {
    let groups = vec![group("q", &[("http://a", 1.0), ("http://b", 2.0), ("http://c", 3.0)])];
    let sources = collect_sources(&groups, 2);

    let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, vec!["http://c", "http://b"]);
}
