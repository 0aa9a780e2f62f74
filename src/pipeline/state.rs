use chrono::Utc;
use std::fmt;

use crate::types::{AggregatedGroup, ResearchReport, SearchResult, Source};

/// 固定的线性阶段：Init → GenerateQueries → Search → Filter → Summarize → Save → Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    GenerateQueries,
    Search,
    Filter,
    Summarize,
    Save,
}

/// 执行顺序
pub const STAGES: [Stage; 5] = [
    Stage::GenerateQueries,
    Stage::Search,
    Stage::Filter,
    Stage::Summarize,
    Stage::Save,
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::GenerateQueries => "generate_queries",
            Stage::Search => "search",
            Stage::Filter => "filter",
            Stage::Summarize => "summarize",
            Stage::Save => "save",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 随阶段推进不断累积的运行状态，阶段只读取在它之前产生的字段
#[derive(Debug, Clone, Default)]
pub struct ResearchState {
    pub topic: String,
    pub queries: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub aggregated: Vec<AggregatedGroup>,
    pub summary: String,
    pub top_sources: Vec<Source>,
    pub report: Option<ResearchReport>,
    pub record_id: Option<String>,
}

/// 单个阶段返回的局部更新
#[derive(Debug, Default)]
pub struct StateUpdate {
    pub queries: Option<Vec<String>>,
    pub search_results: Option<Vec<SearchResult>>,
    pub aggregated: Option<Vec<AggregatedGroup>>,
    pub summary: Option<String>,
    pub top_sources: Option<Vec<Source>>,
    pub report: Option<ResearchReport>,
    pub record_id: Option<String>,
}

impl ResearchState {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..Default::default()
        }
    }

    /// 合并局部更新，未设置的字段保持不变
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(queries) = update.queries {
            self.queries = queries;
        }
        if let Some(search_results) = update.search_results {
            self.search_results = search_results;
        }
        if let Some(aggregated) = update.aggregated {
            self.aggregated = aggregated;
        }
        if let Some(summary) = update.summary {
            self.summary = summary;
        }
        if let Some(top_sources) = update.top_sources {
            self.top_sources = top_sources;
        }
        if let Some(report) = update.report {
            self.report = Some(report);
        }
        if let Some(record_id) = update.record_id {
            self.record_id = Some(record_id);
        }
    }

    /// 由当前状态组装报告
    pub fn build_report(&self) -> ResearchReport {
        ResearchReport {
            topic: self.topic.clone(),
            queries: self.queries.clone(),
            summary: self.summary.clone(),
            top_sources: self.top_sources.clone(),
            all_results: self.aggregated.clone(),
            timestamp: Utc::now(),
        }
    }

    /// 取出 Save 阶段定稿的报告
    pub fn into_report(self) -> ResearchReport {
        match self.report {
            Some(report) => report,
            None => self.build_report(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = STAGES.iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec!["generate_queries", "search", "filter", "summarize", "save"]
        );
    }

    #[test]
    fn test_apply_merges_only_set_fields() {
        let mut state = ResearchState::new("AI in Healthcare");
        state.apply(StateUpdate {
            queries: Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]),
            ..Default::default()
        });
        state.apply(StateUpdate {
            summary: Some("done".to_string()),
            ..Default::default()
        });

        assert_eq!(state.topic, "AI in Healthcare");
        assert_eq!(state.queries.len(), 3);
        assert_eq!(state.summary, "done");
        assert!(state.report.is_none());
    }

    #[test]
    fn test_into_report_prefers_saved_report() {
        let mut state = ResearchState::new("t");
        state.summary = "draft".to_string();
        let mut saved = state.build_report();
        saved.summary = "final".to_string();
        state.apply(StateUpdate {
            report: Some(saved.clone()),
            ..Default::default()
        });

        assert_eq!(state.into_report(), saved);
    }
}
