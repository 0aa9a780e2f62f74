use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::SearchError;
use crate::types::SearchResult;

use super::cache::{CacheStats, SearchCache};
use super::summarizer::SearchProvider;

/// 逐个执行查询：先查缓存，未命中时调用搜索摘要协作方并写回缓存。
/// 查询之间固定间隔以避开搜索引擎限流。
///
/// 缓存随实例存活，跨多次 `run` 复用；实例本身不做同步，
/// 多个运行共享时需由调用方串行化。
pub struct SearchExecutor {
    provider: Arc<dyn SearchProvider>,
    cache: SearchCache,
    inter_query_delay: Duration,
}

impl SearchExecutor {
    pub fn new(provider: Arc<dyn SearchProvider>, inter_query_delay: Duration) -> Self {
        Self::with_cache(provider, SearchCache::new(), inter_query_delay)
    }

    pub fn with_cache(
        provider: Arc<dyn SearchProvider>,
        cache: SearchCache,
        inter_query_delay: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            inter_query_delay,
        }
    }

    /// 结果顺序与 `queries` 一致
    pub async fn run(&mut self, queries: &[String]) -> Result<Vec<SearchResult>, SearchError> {
        let mut results = Vec::with_capacity(queries.len());

        for (i, query) in queries.iter().enumerate() {
            let result = match self.cache.get(query) {
                Some(cached) => {
                    debug!(query = %query, "命中搜索缓存");
                    cached
                }
                None => {
                    let fresh = self.provider.search_and_summarize(query).await?;
                    self.cache.insert(query, fresh.clone());
                    fresh
                }
            };
            info!(
                query = %query,
                results = result.results.len(),
                "查询完成 ({}/{})",
                i + 1,
                queries.len()
            );
            results.push(result);

            if i + 1 < queries.len() {
                tokio::time::sleep(self.inter_query_delay).await;
            }
        }

        Ok(results)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
