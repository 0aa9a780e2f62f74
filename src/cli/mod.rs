use crate::config::{Config, LLMProvider, SearchEngineKind, StorageBackend};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "deepsearch.toml";

/// DeepSearch-RS - 把一个调研主题扩展为多路检索、语义筛选并综合成报告
#[derive(Parser, Debug)]
#[command(name = "deepsearch-rs")]
#[command(
    about = "Turns a research topic into several web searches, semantically filters and ranks the findings, and synthesizes a report with a ranked source list."
)]
#[command(version)]
pub struct Args {
    /// 调研主题
    pub topic: String,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 将完整报告以JSON写入该路径
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// LLM Provider (openai, deepseek, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 模型名称
    #[arg(short, long)]
    pub model: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 搜索引擎 (searxng, tavily)
    #[arg(long)]
    pub search_provider: Option<String>,

    /// 搜索服务地址
    #[arg(long)]
    pub search_url: Option<String>,

    /// 文档存储后端 (file, memory)
    #[arg(long)]
    pub storage: Option<String>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// 读取配置文件：显式指定的路径必须可读，否则尝试工作目录下的默认文件
    fn load_base_config(&self) -> Result<Config> {
        if let Some(config_path) = &self.config {
            return Config::from_file(config_path)
                .with_context(|| format!("无法读取配置文件 {:?}", config_path));
        }

        let default_config_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);

        if default_config_path.exists() {
            Config::from_file(&default_config_path)
                .with_context(|| format!("无法读取默认配置文件 {:?}", default_config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// 将CLI参数转换为配置，命令行参数覆盖配置文件
    pub fn into_config(self) -> Result<Config> {
        let mut config = self.load_base_config()?;

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的provider: {}，使用配置中的provider",
                    provider_str
                ),
            }
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }

        // 覆盖搜索配置
        if let Some(search_provider) = self.search_provider {
            match search_provider.parse::<SearchEngineKind>() {
                Ok(provider) => config.search.provider = provider,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的搜索引擎: {}，使用配置中的搜索引擎",
                    search_provider
                ),
            }
        }
        if let Some(search_url) = self.search_url {
            config.search.base_url = search_url;
        }

        // 存储配置
        if let Some(storage) = self.storage {
            match storage.parse::<StorageBackend>() {
                Ok(backend) => config.storage.backend = backend,
                Err(_) => eprintln!(
                    "⚠️ 警告: 未知的存储后端: {}，使用配置中的存储后端",
                    storage
                ),
            }
        }

        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}
