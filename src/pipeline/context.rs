use anyhow::{Context as _, Result};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::index::{Embedder, SemanticIndex};
use crate::llm::{CompletionOptions, LLMClient, LanguageModel};
use crate::planner::QueryPlanner;
use crate::search::{SearchExecutor, SearchProvider, build_search_executor};
use crate::storage::{DocumentStore, build_document_store};
use crate::synthesis::ReportSynthesizer;

/// 流水线参数
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub filter_limit: usize,
    pub max_sources: usize,
    pub collection: String,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            filter_limit: config.pipeline.filter_limit,
            max_sources: config.pipeline.max_sources,
            collection: config.storage.collection.clone(),
        }
    }
}

/// 一次调研运行用到的全部协作方
#[derive(Clone)]
pub struct ResearchContext {
    pub planner: Arc<QueryPlanner>,
    /// 搜索执行器内部缓存不可并发写，整个 Search 阶段持有该锁
    pub search: Arc<Mutex<SearchExecutor>>,
    pub index: SemanticIndex,
    pub synthesizer: Arc<ReportSynthesizer>,
    pub store: Arc<dyn DocumentStore>,
    pub settings: PipelineSettings,
}

impl ResearchContext {
    pub fn new(
        planner: QueryPlanner,
        search: SearchExecutor,
        index: SemanticIndex,
        synthesizer: ReportSynthesizer,
        store: Arc<dyn DocumentStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            planner: Arc::new(planner),
            search: Arc::new(Mutex::new(search)),
            index,
            synthesizer: Arc::new(synthesizer),
            store,
            settings,
        }
    }

    /// 按配置创建真实的模型、搜索引擎、嵌入模型与存储
    pub fn from_config(config: &Config) -> Result<Self> {
        let llm: Arc<dyn LanguageModel> = Arc::new(
            LLMClient::new(config.llm.clone()).context("Failed to create LLM client")?,
        );
        let search = build_search_executor(config, llm.clone())
            .context("Failed to create search executor")?;
        let index =
            SemanticIndex::from_config(&config.embedding).context("Failed to create embedder")?;
        let store = build_document_store(&config.storage);

        Ok(Self::new(
            planner_for(config, llm.clone()),
            search,
            index,
            synthesizer_for(config, llm),
            store,
            PipelineSettings::from(config),
        ))
    }

    /// 用给定的协作方组装上下文，其余参数取自配置
    pub fn with_collaborators(
        config: &Config,
        llm: Arc<dyn LanguageModel>,
        search_provider: Arc<dyn SearchProvider>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let search = SearchExecutor::new(search_provider, config.search.inter_query_delay());
        let index = SemanticIndex::new(embedder, config.embedding.max_parallels);

        Self::new(
            planner_for(config, llm.clone()),
            search,
            index,
            synthesizer_for(config, llm),
            store,
            PipelineSettings::from(config),
        )
    }
}

fn planner_for(config: &Config, llm: Arc<dyn LanguageModel>) -> QueryPlanner {
    QueryPlanner::new(
        llm,
        CompletionOptions::new(
            config.pipeline.planner_temperature,
            config.pipeline.planner_max_retries,
        ),
    )
}

fn synthesizer_for(config: &Config, llm: Arc<dyn LanguageModel>) -> ReportSynthesizer {
    ReportSynthesizer::new(
        llm,
        CompletionOptions::new(
            config.pipeline.synthesis_temperature,
            config.llm.retry_attempts.saturating_sub(1),
        ),
    )
}
