use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::SearchResult;

/// 缓存统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub entries: usize,
}

impl CacheStats {
    /// 命中率，没有任何查找时为 0
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// 查询字符串到检索结果的缓存。键区分大小写，条目不过期、不淘汰，
/// 只能通过 `clear` 显式清空
#[derive(Debug, Default)]
pub struct SearchCache {
    entries: HashMap<String, SearchResult>,
    stats: CacheStats,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, query: &str) -> Option<SearchResult> {
        match self.entries.get(query) {
            Some(result) => {
                self.stats.hits += 1;
                Some(result.clone())
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, query: &str, result: SearchResult) {
        self.entries.insert(query.to_string(), result);
        self.stats.writes += 1;
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空条目，统计计数保留
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}
