//! 语义索引：按命名空间隔离的嵌入存储与相似度检索

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::error::IndexError;
use crate::types::{IndexedContentItem, Metadata, ScoredMatch};
use crate::utils::threads::do_parallel_with_limit;

pub mod embedder;
pub mod lock;
pub mod namespace;
pub mod similarity;
pub mod store;

pub use embedder::{Embedder, RigEmbedder, build_embedder};
pub use lock::{NamespaceLease, NamespaceLocks};
pub use namespace::namespace_for_topic;

use similarity::cosine_similarity;
use store::NamespaceStore;

#[derive(Clone)]
pub struct SemanticIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<RwLock<NamespaceStore>>,
    locks: NamespaceLocks,
    max_parallels: usize,
}

impl SemanticIndex {
    pub fn new(embedder: Arc<dyn Embedder>, max_parallels: usize) -> Self {
        Self {
            embedder,
            store: Arc::new(RwLock::new(NamespaceStore::new())),
            locks: NamespaceLocks::new(),
            max_parallels: max_parallels.max(1),
        }
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let embedder = build_embedder(config)?;
        Ok(Self::new(embedder, config.max_parallels))
    }

    /// 独占命名空间。写入、检索与清理需要作为整体执行时，
    /// 调用方在整个过程中持有租约
    pub async fn lock_namespace(&self, namespace: &str) -> NamespaceLease {
        self.locks.acquire(namespace).await
    }

    async fn embed_checked(&self, id: &str, text: &str) -> Result<Vec<f32>, IndexError> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| IndexError::Embedding {
                id: id.to_string(),
                detail: e.to_string(),
            })?;

        let expected = self.embedder.dimensions();
        if vector.len() != expected {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// 批量嵌入并写入命名空间。所有向量都计算成功后才统一写入，
    /// 任一条目失败则整批不写入。
    pub async fn add_batch(
        &self,
        namespace: &str,
        items: Vec<IndexedContentItem>,
    ) -> Result<usize, IndexError> {
        if items.is_empty() {
            return Ok(0);
        }

        let futures: Vec<_> = items
            .iter()
            .map(|item| self.embed_checked(&item.id, &item.text))
            .collect();
        let vectors = do_parallel_with_limit(futures, self.max_parallels)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        let count = items.len();
        let mut store = self.store.write().await;
        for (item, vector) in items.into_iter().zip(vectors) {
            store.insert(namespace, item, vector);
        }

        debug!(namespace, count, "已写入语义索引");
        Ok(count)
    }

    /// 在命名空间内检索与 `query_text` 最相近的条目，
    /// 可选按元数据字段做等值过滤。相似度相同的条目保持写入顺序。
    pub async fn search(
        &self,
        namespace: &str,
        query_text: &str,
        filter: Option<&Metadata>,
        limit: usize,
    ) -> Result<Vec<ScoredMatch>, IndexError> {
        if limit == 0 || self.namespace_len(namespace).await == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embed_checked("query", query_text).await?;

        let store = self.store.read().await;
        let mut scored: Vec<(&IndexedContentItem, f32)> = store
            .entries(namespace)
            .into_iter()
            .filter(|entry| matches_filter(&entry.item.metadata, filter))
            .map(|entry| (&entry.item, cosine_similarity(&query_vector, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(item, score)| ScoredMatch {
                key: item.id.clone(),
                value: item.clone(),
                score: Some(score as f64),
            })
            .collect())
    }

    /// 删除命名空间下的全部条目
    pub async fn clear_namespace(&self, namespace: &str) -> usize {
        let mut store = self.store.write().await;
        let removed = store.clear_namespace(namespace);
        let metadata = store.metadata();
        debug!(
            namespace,
            removed,
            total_writes = metadata.total_writes,
            total_removals = metadata.total_removals,
            live_namespaces = store.namespace_count(),
            "已清理命名空间"
        );
        removed
    }

    pub async fn get_by_id(&self, namespace: &str, id: &str) -> Option<IndexedContentItem> {
        self.store
            .read()
            .await
            .get(namespace, id)
            .map(|entry| entry.item.clone())
    }

    pub async fn delete(&self, namespace: &str, id: &str) -> bool {
        self.store.write().await.remove(namespace, id).is_some()
    }

    pub async fn namespace_len(&self, namespace: &str) -> usize {
        self.store.read().await.len(namespace)
    }

    pub async fn namespaces(&self) -> Vec<String> {
        self.store.read().await.namespaces()
    }
}

fn matches_filter(metadata: &Metadata, filter: Option<&Metadata>) -> bool {
    match filter {
        None => true,
        Some(filter) => filter
            .iter()
            .all(|(key, expected)| metadata.get(key) == Some(expected)),
    }
}
