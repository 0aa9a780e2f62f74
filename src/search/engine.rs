//! 搜索引擎协作方：`search(query) -> {title, url, snippet}[]`

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{SearchConfig, SearchEngineKind};
use crate::error::SearchError;
use crate::types::RawResultItem;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";

#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<RawResultItem>, SearchError>;
}

/// SearXNG / Tavily 共用的结果条目格式
#[derive(Debug, Deserialize)]
struct EngineHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct EngineResponse {
    #[serde(default)]
    results: Vec<EngineHit>,
}

impl EngineResponse {
    fn into_items(self, max_results: usize) -> Vec<RawResultItem> {
        self.results
            .into_iter()
            .filter(|hit| !hit.url.is_empty())
            .take(max_results)
            .map(|hit| RawResultItem {
                title: hit.title,
                url: hit.url,
                snippet: hit.content,
            })
            .collect()
    }
}

fn build_http_client(config: &SearchConfig) -> Result<Client, SearchError> {
    Ok(Client::builder().timeout(config.timeout()).build()?)
}

async fn read_response(response: reqwest::Response) -> Result<EngineResponse, SearchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(SearchError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

/// 自建 SearXNG 实例，使用其 JSON 输出格式
pub struct SearxngEngine {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl SearxngEngine {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchEngine for SearxngEngine {
    async fn search(&self, query: &str) -> Result<Vec<RawResultItem>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await?;

        Ok(read_response(response).await?.into_items(self.max_results))
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

/// Tavily 搜索 API
pub struct TavilyEngine {
    client: Client,
    api_key: String,
    max_results: usize,
}

impl TavilyEngine {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        if config.api_key.is_empty() {
            return Err(SearchError::Config(
                "Tavily requires search.api_key (or DEEPSEARCH_SEARCH_API_KEY)".to_string(),
            ));
        }
        Ok(Self {
            client: build_http_client(config)?,
            api_key: config.api_key.clone(),
            max_results: config.max_results,
        })
    }
}

#[async_trait]
impl SearchEngine for TavilyEngine {
    async fn search(&self, query: &str) -> Result<Vec<RawResultItem>, SearchError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };
        let response = self
            .client
            .post(TAVILY_API_URL)
            .json(&request)
            .send()
            .await?;

        Ok(read_response(response).await?.into_items(self.max_results))
    }
}

/// 根据配置创建搜索引擎
pub fn build_search_engine(config: &SearchConfig) -> Result<Arc<dyn SearchEngine>, SearchError> {
    let engine: Arc<dyn SearchEngine> = match config.provider {
        SearchEngineKind::Searxng => Arc::new(SearxngEngine::new(config)?),
        SearchEngineKind::Tavily => Arc::new(TavilyEngine::new(config)?),
    };
    Ok(engine)
}
