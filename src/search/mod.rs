//! 搜索阶段：限流、缓存、重试的查询执行

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::llm::{CompletionOptions, LanguageModel};

pub mod cache;
pub mod engine;
pub mod executor;
pub mod fetcher;
pub mod summarizer;

pub use cache::{CacheStats, SearchCache};
pub use engine::{SearchEngine, build_search_engine};
pub use executor::SearchExecutor;
pub use fetcher::{ResultFetcher, RetryPolicy};
pub use summarizer::{SearchProvider, WebResearcher};

/// 按配置组装搜索执行器：搜索引擎 → 重试抓取 → 摘要 → 缓存
pub fn build_search_executor(
    config: &Config,
    llm: Arc<dyn LanguageModel>,
) -> Result<SearchExecutor> {
    let engine = build_search_engine(&config.search)?;
    let fetcher = ResultFetcher::new(engine, RetryPolicy::from(&config.search));
    let options = CompletionOptions::new(
        config.llm.temperature,
        config.llm.retry_attempts.saturating_sub(1),
    );
    let researcher = WebResearcher::new(fetcher, llm, options);

    Ok(SearchExecutor::new(
        Arc::new(researcher),
        config.search.inter_query_delay(),
    ))
}
