//! 查询规划：把调研主题拆成 3-5 条互补的检索查询

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::utils::json_extract::extract_validated;

pub const MIN_QUERIES: usize = 3;
pub const MAX_QUERIES: usize = 5;

/// 模型需要返回的结构化输出
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct QueryPlan {
    /// 覆盖主题不同侧面的检索查询
    #[schemars(length(min = 3, max = 5))]
    pub queries: Vec<String>,
}

impl QueryPlan {
    /// 校验数量与内容，返回修剪后的查询
    pub fn validate(self) -> Result<Vec<String>, GenerationError> {
        if !(MIN_QUERIES..=MAX_QUERIES).contains(&self.queries.len()) {
            return Err(GenerationError::SchemaMismatch {
                detail: format!(
                    "expected {}-{} queries, got {}",
                    MIN_QUERIES,
                    MAX_QUERIES,
                    self.queries.len()
                ),
            });
        }

        let queries: Vec<String> = self
            .queries
            .into_iter()
            .map(|q| q.trim().to_string())
            .collect();

        if let Some(position) = queries.iter().position(|q| q.is_empty()) {
            return Err(GenerationError::SchemaMismatch {
                detail: format!("query at index {} is empty", position),
            });
        }

        Ok(queries)
    }
}

pub struct QueryPlanner {
    llm: Arc<dyn LanguageModel>,
    options: CompletionOptions,
}

impl QueryPlanner {
    pub fn new(llm: Arc<dyn LanguageModel>, options: CompletionOptions) -> Self {
        Self { llm, options }
    }

    fn build_prompt(topic: &str) -> String {
        let schema = schemars::schema_for!(QueryPlan);
        let schema_text = serde_json::to_string_pretty(&schema).unwrap_or_default();

        format!(
            r#"Generate between {min} and {max} diverse web search queries to research the topic below.
Each query should cover a different aspect of the topic (background, current state, key players, challenges, outlook).

Topic: {topic}

Respond with ONLY a JSON object matching this JSON Schema, with no extra commentary:
{schema_text}"#,
            min = MIN_QUERIES,
            max = MAX_QUERIES,
        )
    }

    /// 生成查询；模型输出不合法时返回 `GenerationError`，此处不重试
    pub async fn plan(&self, topic: &str) -> Result<Vec<String>, GenerationError> {
        let prompt = Self::build_prompt(topic);
        let raw = self
            .llm
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| GenerationError::Completion(e.to_string()))?;
        debug!(raw_len = raw.len(), "查询规划模型已返回");

        // 模型有时先写出草稿对象，取第一个通过校验的
        let queries = extract_validated(&raw, QueryPlan::validate)?;

        info!(topic, count = queries.len(), "已生成检索查询");
        Ok(queries)
    }
}
