use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::types::RawResultItem;

use super::engine::SearchEngine;

/// 原始结果抓取的重试策略：固定间隔，不做指数退避
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(3000),
        }
    }
}

impl From<&SearchConfig> for RetryPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

/// 带重试的原始结果抓取
pub struct ResultFetcher {
    engine: Arc<dyn SearchEngine>,
    policy: RetryPolicy,
}

impl ResultFetcher {
    pub fn new(engine: Arc<dyn SearchEngine>, policy: RetryPolicy) -> Self {
        Self { engine, policy }
    }

    /// 结果为空或请求出错都会重试；次数用尽后返回空列表而不是错误，
    /// 单个查询失败不影响整次运行
    pub async fn fetch(&self, query: &str) -> Vec<RawResultItem> {
        for attempt in 1..=self.policy.max_attempts {
            match self.engine.search(query).await {
                Ok(items) if !items.is_empty() => {
                    debug!(query, attempt, count = items.len(), "搜索成功");
                    return items;
                }
                Ok(_) => {
                    warn!(query, attempt, "搜索结果为空");
                }
                Err(e) => {
                    warn!(query, attempt, error = %e, "搜索请求失败");
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        warn!(
            query,
            attempts = self.policy.max_attempts,
            "重试次数用尽，返回空结果"
        );
        Vec::new()
    }
}
