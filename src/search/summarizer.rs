use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::error::SearchError;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::types::{RawResultItem, SearchResult};

use super::fetcher::ResultFetcher;

pub const NO_RESULTS_SUMMARY: &str = "No search results were found for this query.";

/// 搜索并摘要：一个查询对应一个 `SearchResult`
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_and_summarize(&self, query: &str) -> Result<SearchResult, SearchError>;
}

/// 抓取原始结果后由语言模型写出摘要
pub struct WebResearcher {
    fetcher: ResultFetcher,
    llm: Arc<dyn LanguageModel>,
    options: CompletionOptions,
}

impl WebResearcher {
    pub fn new(
        fetcher: ResultFetcher,
        llm: Arc<dyn LanguageModel>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            fetcher,
            llm,
            options,
        }
    }

    fn build_prompt(query: &str, items: &[RawResultItem]) -> String {
        let mut sources = String::new();
        for (i, item) in items.iter().enumerate() {
            sources.push_str(&format!(
                "[{}] {}\nURL: {}\n{}\n\n",
                i + 1,
                item.title,
                item.url,
                item.snippet
            ));
        }

        format!(
            "Summarize what the following search results say about \"{}\".\n\
             Write one concise paragraph, cite facts only from the results, and do not invent sources.\n\n\
             {}",
            query, sources
        )
    }
}

#[async_trait]
impl SearchProvider for WebResearcher {
    async fn search_and_summarize(&self, query: &str) -> Result<SearchResult, SearchError> {
        let items = self.fetcher.fetch(query).await;
        if items.is_empty() {
            return Ok(SearchResult::new(query, items, NO_RESULTS_SUMMARY.to_string()));
        }

        let prompt = Self::build_prompt(query, &items);
        let summary = self
            .llm
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| SearchError::Summary {
                query: query.to_string(),
                detail: e.to_string(),
            })?;
        debug!(query, results = items.len(), "已生成查询摘要");

        Ok(SearchResult::new(query, items, summary.trim().to_string()))
    }
}
