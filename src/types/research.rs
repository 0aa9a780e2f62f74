use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 存储于语义索引中的元数据
pub type Metadata = Map<String, Value>;

/// 元数据中的字段名
pub struct MetadataKeys;

impl MetadataKeys {
    pub const TITLE: &'static str = "title";
    pub const URL: &'static str = "url";
    pub const SNIPPET: &'static str = "snippet";
    pub const QUERY: &'static str = "query";
    pub const SUMMARY: &'static str = "summary";
}

/// 搜索引擎返回的单条原始结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RawResultItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// 单个查询的检索结果，summary 只在生成时写入一次
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchResult {
    pub query: String,
    pub results: Vec<RawResultItem>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl SearchResult {
    pub fn new(query: &str, results: Vec<RawResultItem>, summary: String) -> Self {
        Self {
            query: query.to_string(),
            results,
            summary,
            timestamp: Utc::now(),
        }
    }
}

/// 可嵌入的内容条目：原始结果 + 所属查询 + 查询摘要
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndexedContentItem {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

impl IndexedContentItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// 由原始结果构建索引条目，嵌入文本为 标题 + 摘录 + 查询
    pub fn from_result_item(id: String, item: &RawResultItem, query: &str, summary: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert(MetadataKeys::TITLE.to_string(), Value::from(item.title.as_str()));
        metadata.insert(MetadataKeys::URL.to_string(), Value::from(item.url.as_str()));
        metadata.insert(MetadataKeys::SNIPPET.to_string(), Value::from(item.snippet.as_str()));
        metadata.insert(MetadataKeys::QUERY.to_string(), Value::from(query));
        metadata.insert(MetadataKeys::SUMMARY.to_string(), Value::from(summary));

        let text = format!("{}\n{}\n{}", item.title, item.snippet, query);
        Self { id, text, metadata }
    }

    /// 读取字符串类型的元数据字段
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// 相似度检索的命中结果，score 为未归一化的相似度
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScoredMatch {
    pub key: String,
    pub value: IndexedContentItem,
    pub score: Option<f64>,
}

/// 经过语义筛选后保留的条目
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub relevance_score: f64,
}

/// 按原始查询重新分组后的结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub query: String,
    pub results: Vec<AggregatedItem>,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

/// 去重排序后的来源
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Source {
    pub url: String,
    pub title: String,
    pub relevance: f64,
}

/// 一次调研运行的最终产物
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub topic: String,
    pub queries: Vec<String>,
    pub summary: String,
    pub top_sources: Vec<Source>,
    pub all_results: Vec<AggregatedGroup>,
    pub timestamp: DateTime<Utc>,
}

/// 写入文档数据库的记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResearchRecord {
    pub query: String,
    pub summary: String,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&ResearchReport> for ResearchRecord {
    fn from(report: &ResearchReport) -> Self {
        Self {
            query: report.topic.clone(),
            summary: report.summary.clone(),
            sources: report.top_sources.iter().map(|s| s.url.clone()).collect(),
            timestamp: report.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> RawResultItem {
        RawResultItem {
            title: "Deep learning for radiology".to_string(),
            url: "https://example.org/radiology".to_string(),
            snippet: "CNNs now match radiologists on chest X-rays".to_string(),
        }
    }

    #[test]
    fn test_indexed_item_carries_query_and_summary() {
        let item = IndexedContentItem::from_result_item(
            "q0-r0".to_string(),
            &sample_item(),
            "AI diagnostics",
            "Imaging is the most mature area",
        );

        assert_eq!(item.id, "q0-r0");
        assert!(item.text.contains("Deep learning for radiology"));
        assert!(item.text.contains("chest X-rays"));
        assert!(item.text.ends_with("AI diagnostics"));
        assert_eq!(item.metadata_str(MetadataKeys::QUERY), Some("AI diagnostics"));
        assert_eq!(
            item.metadata_str(MetadataKeys::URL),
            Some("https://example.org/radiology")
        );
        assert_eq!(
            item.metadata_str(MetadataKeys::SUMMARY),
            Some("Imaging is the most mature area")
        );
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ResearchReport {
            topic: "AI in Healthcare".to_string(),
            queries: vec!["a".to_string()],
            summary: "s".to_string(),
            top_sources: vec![],
            all_results: vec![],
            timestamp: Utc::now(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("topSources").is_some());
        assert!(json.get("allResults").is_some());
    }

    #[test]
    fn test_record_from_report_keeps_source_order() {
        let report = ResearchReport {
            topic: "AI in Healthcare".to_string(),
            queries: vec![],
            summary: "summary".to_string(),
            top_sources: vec![
                Source {
                    url: "http://b".to_string(),
                    title: "B".to_string(),
                    relevance: 9.0,
                },
                Source {
                    url: "http://a".to_string(),
                    title: "A".to_string(),
                    relevance: 4.0,
                },
            ],
            all_results: vec![],
            timestamp: Utc::now(),
        };

        let record = ResearchRecord::from(&report);
        assert_eq!(record.query, "AI in Healthcare");
        assert_eq!(record.sources, vec!["http://b", "http://a"]);
        assert_eq!(record.timestamp, report.timestamp);
    }
}
