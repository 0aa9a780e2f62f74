//! 结果聚合：按原始查询重新分组、归一化相关度、来源去重排序

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::MAX_TOP_SOURCES;
use crate::types::{
    AggregatedGroup, AggregatedItem, MetadataKeys, ScoredMatch, SearchResult, Source,
};

/// 缺少相似度时的默认相关度
pub const DEFAULT_RELEVANCE: f64 = 5.0;
pub const MAX_RELEVANCE: f64 = 10.0;

/// 相似度线性映射到 [0, 10]，缺失或 NaN 时取默认值
pub fn relevance_score(score: Option<f64>) -> f64 {
    match score {
        Some(s) if !s.is_nan() => (s * 10.0).clamp(0.0, MAX_RELEVANCE),
        _ => DEFAULT_RELEVANCE,
    }
}

fn metadata_string(m: &ScoredMatch, key: &str) -> String {
    m.value.metadata_str(key).unwrap_or_default().to_string()
}

/// 把相似度命中按所属查询分组。分组顺序为查询在命中列表中首次出现的顺序；
/// 没有命中的查询整组丢弃，不属于任何原始查询的命中也丢弃。
pub fn aggregate(
    topic: &str,
    original: &[SearchResult],
    matches: &[ScoredMatch],
) -> Vec<AggregatedGroup> {
    let mut groups: Vec<AggregatedGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut orphans = 0usize;

    for m in matches {
        let Some(query) = m.value.metadata_str(MetadataKeys::QUERY) else {
            orphans += 1;
            continue;
        };

        let index = match group_index.get(query) {
            Some(&index) => index,
            None => {
                let Some(source) = original.iter().find(|r| r.query == query) else {
                    orphans += 1;
                    continue;
                };
                groups.push(AggregatedGroup {
                    query: source.query.clone(),
                    results: Vec::new(),
                    summary: source.summary.clone(),
                    timestamp: source.timestamp,
                });
                group_index.insert(query.to_string(), groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[index].results.push(AggregatedItem {
            title: metadata_string(m, MetadataKeys::TITLE),
            url: metadata_string(m, MetadataKeys::URL),
            snippet: metadata_string(m, MetadataKeys::SNIPPET),
            relevance_score: relevance_score(m.score),
        });
    }

    debug!(
        topic,
        groups = groups.len(),
        dropped_queries = original.len().saturating_sub(groups.len()),
        orphans,
        "聚合完成"
    );
    groups
}

/// 来源去重并排序：url 首次出现者保留（后出现的重复项即使相关度更高也丢弃），
/// 按相关度降序稳定排序后截取前 `max_sources` 条（不超过 15）
pub fn collect_sources(groups: &[AggregatedGroup], max_sources: usize) -> Vec<Source> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut sources: Vec<Source> = Vec::new();

    for item in groups.iter().flat_map(|g| g.results.iter()) {
        if seen.insert(item.url.as_str()) {
            sources.push(Source {
                url: item.url.clone(),
                title: item.title.clone(),
                relevance: item.relevance_score,
            });
        }
    }

    sources.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
    sources.truncate(max_sources.min(MAX_TOP_SOURCES));
    sources
}

#[cfg(test)]
mod tests;
