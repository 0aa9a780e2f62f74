//! LLM客户端 - 提供统一的文本补全接口

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::LLMConfig;

mod providers;

use providers::ProviderClient;

const SYSTEM_PROMPT: &str = "You are a meticulous research assistant. Follow the output format requested by the user exactly.";

/// 单次补全调用的参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f64,
    /// 首次调用失败后的额外重试次数
    pub max_retries: u32,
}

impl CompletionOptions {
    pub fn new(temperature: f64, max_retries: u32) -> Self {
        Self {
            temperature,
            max_retries,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::new(0.7, 2)
    }
}

/// 语言模型协作方：`complete(prompt, options) -> text`
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// LLM客户端
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接是否正常
    pub async fn check_connection(&self) -> Result<()> {
        let options = CompletionOptions::new(self.config.temperature, 0);
        match self.complete("Reply with the single word: ok", &options).await {
            Ok(_) => {
                info!(provider = %self.config.provider, model = %self.config.model, "模型连接正常");
                Ok(())
            }
            Err(e) => {
                warn!(provider = %self.config.provider, error = %e, "模型连接失败");
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，固定间隔，单次调用受超时约束
    async fn retry_with_backoff<T, F, Fut>(&self, max_attempts: u32, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let outcome = match tokio::time::timeout(timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "model call timed out after {}s",
                    self.config.timeout_seconds
                )),
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    warn!(
                        attempt = attempts,
                        max_attempts,
                        error = %err,
                        "调用模型服务出错"
                    );
                    if attempts >= max_attempts {
                        return Err(err);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl LanguageModel for LLMClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        let agent = self
            .client
            .create_agent(&self.config, SYSTEM_PROMPT, options.temperature)?;

        self.retry_with_backoff(options.max_retries + 1, || agent.prompt(prompt))
            .await
    }
}
