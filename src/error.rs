//! 错误类型
//!
//! 每个失败族一个 thiserror 枚举；一次调研运行只对外返回 `PipelineError`。

use thiserror::Error;

use crate::pipeline::state::Stage;
use crate::types::ResearchReport;

/// 查询规划无法拿到合法的结构化输出
#[derive(Error, Debug)]
pub enum GenerationError {
    /// 模型输出中找不到成对的大括号
    #[error("no JSON object found in model output: {excerpt}")]
    NoJsonObject { excerpt: String },

    /// 找到了 JSON 片段但解析失败
    #[error("model output is not valid JSON: {detail}")]
    InvalidJson { detail: String },

    /// JSON 合法但不符合约定的 schema
    #[error("structured output does not match schema: {detail}")]
    SchemaMismatch { detail: String },

    /// 语言模型调用本身失败
    #[error("language model call failed: {0}")]
    Completion(String),
}

/// 搜索引擎或搜索摘要失败
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search engine returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("search engine configuration error: {0}")]
    Config(String),

    #[error("failed to summarize results for query '{query}': {detail}")]
    Summary { query: String, detail: String },
}

/// 嵌入或相似度检索失败
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("embedding failed for item '{id}': {detail}")]
    Embedding { id: String, detail: String },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// 文档数据库写入失败
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document store error: {0}")]
    Backend(String),
}

/// 单个阶段内部的失败原因
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("report synthesis failed: {0}")]
    Synthesis(String),
}

/// 一次调研运行对外返回的唯一错误
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// 某个阶段失败，整个运行中止
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// 报告已完整生成，但保存失败；调用方仍可使用 report
    #[error("research report was generated but could not be saved: {source}")]
    Persistence {
        report: Box<ResearchReport>,
        #[source]
        source: PersistenceError,
    },
}

impl PipelineError {
    pub fn stage(stage: Stage, source: impl Into<StageError>) -> Self {
        PipelineError::Stage {
            stage,
            source: source.into(),
        }
    }

    /// 失败所在的阶段
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            PipelineError::InvalidTopic(_) => None,
            PipelineError::Stage { stage, .. } => Some(*stage),
            PipelineError::Persistence { .. } => Some(Stage::Save),
        }
    }
}
