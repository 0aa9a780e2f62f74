use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::Instant;

use deepsearch_rs::config::Config;
use deepsearch_rs::error::{PipelineError, SearchError};
use deepsearch_rs::index::{Embedder, SemanticIndex, namespace_for_topic};
use deepsearch_rs::llm::{CompletionOptions, LanguageModel};
use deepsearch_rs::pipeline::{
    PipelineOrchestrator, PipelineSettings, ResearchContext, Stage,
};
use deepsearch_rs::planner::QueryPlanner;
use deepsearch_rs::search::{
    ResultFetcher, RetryPolicy, SearchEngine, SearchExecutor, WebResearcher,
};
use deepsearch_rs::storage::{DocumentStore, InMemoryDocumentStore, JsonFileStore};
use deepsearch_rs::synthesis::ReportSynthesizer;
use deepsearch_rs::types::{IndexedContentItem, Metadata, RawResultItem};

const TOPIC: &str = "AI in Healthcare";
const QUERIES: [&str; 3] = [
    "AI medical imaging diagnostics",
    "AI drug discovery pipelines",
    "AI hospital workflow automation",
];

/// 查询规划返回固定 JSON，其余调用返回摘要文本
struct ScriptedLlm {
    plan_reply: String,
}

impl ScriptedLlm {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            plan_reply: serde_json::json!({ "queries": QUERIES }).to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> anyhow::Result<String> {
        if prompt.contains("JSON Schema") {
            Ok(format!("Here are the queries:\n{}\n", self.plan_reply))
        } else if prompt.contains("research report") {
            Ok("AI is reshaping diagnostics, drug discovery and operations.".to_string())
        } else {
            Ok("Per-query summary.".to_string())
        }
    }
}

/// 每个查询返回 5 条 url 各不相同的结果
#[derive(Default)]
struct FiveHitEngine {
    calls: Mutex<Vec<String>>,
    empty_for: Option<&'static str>,
}

#[async_trait]
impl SearchEngine for FiveHitEngine {
    async fn search(&self, query: &str) -> Result<Vec<RawResultItem>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());
        if self.empty_for == Some(query) {
            return Ok(Vec::new());
        }
        let slug = query.to_lowercase().replace(' ', "-");
        Ok((0..5)
            .map(|i| RawResultItem {
                title: format!("{} #{}", query, i),
                url: format!("https://news.example/{}/{}", slug, i),
                snippet: format!("healthcare AI evidence {} for {}", i, query),
            })
            .collect())
    }
}

/// 词袋哈希嵌入，分量非负
struct BagOfWordsEmbedder;

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    fn dimensions(&self) -> usize {
        32
    }

    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut vector = vec![0.0f32; 32];
        for word in text.to_lowercase().split_whitespace() {
            let bucket = word.bytes().fold(7usize, |h, b| h * 31 + b as usize) % 32;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }
}

struct RejectingStore;

#[async_trait]
impl DocumentStore for RejectingStore {
    async fn insert(
        &self,
        _collection: &str,
        _document: Value,
    ) -> Result<String, deepsearch_rs::error::PersistenceError> {
        Err(deepsearch_rs::error::PersistenceError::Backend(
            "write quorum not reached".to_string(),
        ))
    }
}

fn build_orchestrator(
    engine: Arc<FiveHitEngine>,
    store: Arc<dyn DocumentStore>,
    inter_query_delay: Duration,
) -> PipelineOrchestrator {
    let config = Config::default();
    let llm: Arc<dyn LanguageModel> = ScriptedLlm::new();

    let fetcher = ResultFetcher::new(engine, RetryPolicy::default());
    let researcher = WebResearcher::new(fetcher, llm.clone(), CompletionOptions::default());
    let executor = SearchExecutor::new(Arc::new(researcher), inter_query_delay);

    let ctx = ResearchContext::new(
        QueryPlanner::new(llm.clone(), CompletionOptions::new(0.7, 2)),
        executor,
        SemanticIndex::new(Arc::new(BagOfWordsEmbedder), 4),
        ReportSynthesizer::new(llm, CompletionOptions::new(0.3, 2)),
        store,
        PipelineSettings::from(&config),
    );
    PipelineOrchestrator::new(ctx)
}

#[tokio::test(start_paused = true)]
async fn test_ai_in_healthcare_end_to_end() {
    let engine = Arc::new(FiveHitEngine::default());
    let store = Arc::new(InMemoryDocumentStore::new());
    let orchestrator = build_orchestrator(engine.clone(), store.clone(), Duration::from_millis(2000));

    let start = Instant::now();
    let report = orchestrator.run(TOPIC).await.unwrap();

    // 3 条查询之间各间隔 2 秒
    assert!(start.elapsed() >= Duration::from_millis(4000));
    assert_eq!(*engine.calls.lock().unwrap(), QUERIES.to_vec());

    assert_eq!(report.topic, TOPIC);
    assert_eq!(report.queries, QUERIES.to_vec());
    assert_eq!(report.all_results.len(), 3);
    for group in &report.all_results {
        assert!(QUERIES.contains(&group.query.as_str()));
        assert_eq!(group.results.len(), 5);
        assert_eq!(group.summary, "Per-query summary.");
        assert!(group
            .results
            .iter()
            .all(|item| (0.0..=10.0).contains(&item.relevance_score)));
    }

    assert_eq!(report.top_sources.len(), 15);
    assert!(report
        .top_sources
        .windows(2)
        .all(|w| w[0].relevance >= w[1].relevance));
    let urls: HashSet<&str> = report.top_sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls.len(), 15);

    let documents = store.documents("research_results").await;
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["query"], TOPIC);
    assert_eq!(documents[0]["sources"].as_array().unwrap().len(), 15);

    assert_eq!(
        orchestrator
            .context()
            .index
            .namespace_len(&namespace_for_topic(TOPIC))
            .await,
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_query_degrades_without_aborting() {
    let engine = Arc::new(FiveHitEngine {
        empty_for: Some(QUERIES[1]),
        ..Default::default()
    });
    let orchestrator = build_orchestrator(
        engine.clone(),
        Arc::new(InMemoryDocumentStore::new()),
        Duration::ZERO,
    );

    let report = orchestrator.run(TOPIC).await.unwrap();

    let attempts = engine
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|q| q.as_str() == QUERIES[1])
        .count();
    assert_eq!(attempts, 3);
    assert_eq!(report.all_results.len(), 2);
    assert!(report.all_results.iter().all(|g| g.query != QUERIES[1]));
    assert_eq!(report.top_sources.len(), 10);
}

#[tokio::test]
async fn test_report_is_persisted_to_file_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::new(temp_dir.path()));
    let orchestrator = build_orchestrator(
        Arc::new(FiveHitEngine::default()),
        store.clone(),
        Duration::ZERO,
    );

    let report = orchestrator.run(TOPIC).await.unwrap();

    let documents = store.read_all("research_results").await.unwrap();
    assert_eq!(documents.len(), 1);
    assert!(documents[0]["_id"].is_string());
    assert_eq!(documents[0]["summary"], report.summary.as_str());
}

#[tokio::test]
async fn test_persistence_failure_keeps_report() {
    let orchestrator = build_orchestrator(
        Arc::new(FiveHitEngine::default()),
        Arc::new(RejectingStore),
        Duration::ZERO,
    );

    let err = orchestrator.run(TOPIC).await.unwrap_err();

    assert_eq!(err.failed_stage(), Some(Stage::Save));
    assert!(err.to_string().contains("could not be saved"));
    let PipelineError::Persistence { report, .. } = err else {
        panic!("expected a persistence error");
    };
    assert_eq!(report.top_sources.len(), 15);
    assert!(!report.summary.is_empty());
}

#[tokio::test]
async fn test_stage_failure_identifies_stage() {
    struct SilentLlm;

    #[async_trait]
    impl LanguageModel for SilentLlm {
        async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> anyhow::Result<String> {
            Err(anyhow!("upstream timeout"))
        }
    }

    let ctx = ResearchContext::with_collaborators(
        &Config::default(),
        Arc::new(SilentLlm),
        Arc::new(WebResearcher::new(
            ResultFetcher::new(Arc::new(FiveHitEngine::default()), RetryPolicy::default()),
            Arc::new(SilentLlm),
            CompletionOptions::default(),
        )),
        Arc::new(BagOfWordsEmbedder),
        Arc::new(InMemoryDocumentStore::new()),
    );

    let err = PipelineOrchestrator::new(ctx).run(TOPIC).await.unwrap_err();

    assert_eq!(err.failed_stage(), Some(Stage::GenerateQueries));
    assert!(err.to_string().contains("generate_queries"));
}

#[tokio::test]
async fn test_namespace_isolation_between_topics() {
    let index = SemanticIndex::new(Arc::new(BagOfWordsEmbedder), 4);
    let xy = namespace_for_topic("X Y");
    let z = namespace_for_topic("Z");

    index
        .add_batch(
            &xy,
            vec![IndexedContentItem::new(
                "doc-1",
                "x y research findings",
                Metadata::new(),
            )],
        )
        .await
        .unwrap();

    assert!(index.search(&z, "x y research findings", None, 20).await.unwrap().is_empty());
    let hits = index.search(&xy, "x y research findings", None, 20).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].key, "doc-1");

    index.clear_namespace(&xy).await;
    assert!(index.namespaces().await.is_empty());
}
