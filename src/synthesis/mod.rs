//! 报告综合：把聚合后的发现交给语言模型写成正文

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use crate::error::StageError;
use crate::llm::{CompletionOptions, LanguageModel};
use crate::types::AggregatedGroup;

pub struct ReportSynthesizer {
    llm: Arc<dyn LanguageModel>,
    options: CompletionOptions,
}

impl ReportSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, options: CompletionOptions) -> Self {
        Self { llm, options }
    }

    fn build_prompt(topic: &str, queries: &[String], groups: &[AggregatedGroup]) -> String {
        let mut findings = String::new();
        for group in groups {
            let _ = writeln!(findings, "## {}", group.query);
            let _ = writeln!(findings, "{}", group.summary);
            for item in &group.results {
                let _ = writeln!(
                    findings,
                    "- {} ({}) relevance {:.1}/10",
                    item.title, item.url, item.relevance_score
                );
            }
            findings.push('\n');
        }
        if groups.is_empty() {
            findings.push_str("(no relevant findings were retained)\n");
        }

        format!(
            "You are writing a research report on \"{topic}\".\n\
             The following search queries were run: {queries}.\n\n\
             Findings grouped by query:\n\n{findings}\n\
             Write a well-structured report that synthesizes these findings: key themes, \
             notable facts, open questions. Refer to sources by URL where relevant and do not \
             invent information that is not in the findings.",
            queries = queries.join("; "),
        )
    }

    pub async fn synthesize(
        &self,
        topic: &str,
        queries: &[String],
        groups: &[AggregatedGroup],
    ) -> Result<String, StageError> {
        let prompt = Self::build_prompt(topic, queries, groups);
        let summary = self
            .llm
            .complete(&prompt, &self.options)
            .await
            .map_err(|e| StageError::Synthesis(e.to_string()))?;

        info!(topic, chars = summary.len(), "报告正文已生成");
        Ok(summary.trim().to_string())
    }
}
