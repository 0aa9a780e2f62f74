use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 报告中来源列表的硬上限
pub const MAX_TOP_SOURCES: usize = 15;

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "ollama")]
    Ollama,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "anthropic" => Ok(LLMProvider::Anthropic),
            "gemini" => Ok(LLMProvider::Gemini),
            "ollama" => Ok(LLMProvider::Ollama),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Embedding Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum EmbeddingProvider {
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "ollama")]
    #[default]
    Ollama,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProvider::OpenAI),
            "ollama" => Ok(EmbeddingProvider::Ollama),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

/// 搜索引擎类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum SearchEngineKind {
    #[serde(rename = "searxng")]
    #[default]
    Searxng,
    #[serde(rename = "tavily")]
    Tavily,
}

impl std::fmt::Display for SearchEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchEngineKind::Searxng => write!(f, "searxng"),
            SearchEngineKind::Tavily => write!(f, "tavily"),
        }
    }
}

impl std::str::FromStr for SearchEngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "searxng" => Ok(SearchEngineKind::Searxng),
            "tavily" => Ok(SearchEngineKind::Tavily),
            _ => Err(format!("Unknown search provider: {}", s)),
        }
    }
}

/// 文档存储后端
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum StorageBackend {
    #[serde(rename = "file")]
    #[default]
    File,
    #[serde(rename = "memory")]
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// 是否启用详细日志
    pub verbose: bool,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 嵌入模型配置
    pub embedding: EmbeddingConfig,

    /// 搜索配置
    pub search: SearchConfig,

    /// 流水线参数
    pub pipeline: PipelineConfig,

    /// 文档存储配置
    pub storage: StorageConfig,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 模型名称
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 默认温度
    pub temperature: f64,

    /// 重试次数
    pub retry_attempts: u32,

    /// 重试间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

/// 嵌入模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,

    pub api_key: String,

    pub api_base_url: String,

    pub model: String,

    /// 向量维度，索引与查询必须一致
    pub dimensions: usize,

    /// addBatch 内并发嵌入的上限
    pub max_parallels: usize,
}

/// 搜索配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchEngineKind,

    /// 搜索服务地址
    pub base_url: String,

    pub api_key: String,

    /// 每个查询保留的结果数
    pub max_results: usize,

    /// 单次请求超时（秒）
    pub timeout_seconds: u64,

    /// 单个查询的最大尝试次数
    pub retry_attempts: u32,

    /// 两次尝试之间的固定间隔（毫秒）
    pub retry_delay_ms: u64,

    /// 相邻查询之间的固定间隔（毫秒），用于规避限流
    pub inter_query_delay_ms: u64,
}

/// 流水线参数
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Filter 阶段语义检索的条数
    pub filter_limit: usize,

    /// 报告中来源的最大数量
    pub max_sources: usize,

    pub planner_temperature: f64,

    pub planner_max_retries: u32,

    pub synthesis_temperature: f64,
}

/// 文档存储配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// 文件存储目录
    pub data_dir: PathBuf,

    /// 写入的集合名称
    pub collection: String,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 检查会破坏运行约束的配置
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimensions == 0 {
            bail!("embedding.dimensions must be greater than 0");
        }
        if self.embedding.max_parallels == 0 {
            bail!("embedding.max_parallels must be greater than 0");
        }
        if self.pipeline.max_sources == 0 || self.pipeline.max_sources > MAX_TOP_SOURCES {
            bail!(
                "pipeline.max_sources must be between 1 and {}, got {}",
                MAX_TOP_SOURCES,
                self.pipeline.max_sources
            );
        }
        if self.pipeline.filter_limit == 0 {
            bail!("pipeline.filter_limit must be greater than 0");
        }
        if self.search.retry_attempts == 0 {
            bail!("search.retry_attempts must be greater than 0");
        }
        if self.search.max_results == 0 {
            bail!("search.max_results must be greater than 0");
        }
        if self.llm.retry_attempts == 0 {
            bail!("llm.retry_attempts must be greater than 0");
        }
        Ok(())
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn inter_query_delay(&self) -> Duration {
        Duration::from_millis(self.inter_query_delay_ms)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("DEEPSEARCH_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://api.openai.com/v1"),
            model: String::from("gpt-4o-mini"),
            max_tokens: 4096,
            temperature: 0.7,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            timeout_seconds: 120,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            api_key: std::env::var("DEEPSEARCH_EMBEDDING_API_KEY").unwrap_or_default(),
            api_base_url: String::from("http://localhost:11434"),
            model: String::from("nomic-embed-text"),
            dimensions: 768,
            max_parallels: 8,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchEngineKind::default(),
            base_url: String::from("http://localhost:8888"),
            api_key: std::env::var("DEEPSEARCH_SEARCH_API_KEY").unwrap_or_default(),
            max_results: 5,
            timeout_seconds: 10,
            retry_attempts: 3,
            retry_delay_ms: 3000,
            inter_query_delay_ms: 2000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter_limit: 20,
            max_sources: MAX_TOP_SOURCES,
            planner_temperature: 0.7,
            planner_max_retries: 2,
            synthesis_temperature: 0.3,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: PathBuf::from(".deepsearch/data"),
            collection: String::from("research_results"),
        }
    }
}
