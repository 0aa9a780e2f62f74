//! 文档数据库协作方：单集合、只追加的写入

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::PersistenceError;

/// 生成的文档 id 字段
pub const ID_FIELD: &str = "_id";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 写入文档，返回生成的 id
    async fn insert(&self, collection: &str, document: Value) -> Result<String, PersistenceError>;
}

fn with_generated_id(document: Value) -> Result<(String, Value), PersistenceError> {
    let Value::Object(mut fields) = document else {
        return Err(PersistenceError::Backend(
            "documents must be JSON objects".to_string(),
        ));
    };
    let id = uuid::Uuid::new_v4().to_string();
    fields.insert(ID_FIELD.to_string(), Value::from(id.as_str()));
    Ok((id, Value::Object(fields)))
}

/// 每个集合一个 JSON Lines 文件
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.jsonl", collection))
    }

    /// 读取集合内的全部文档
    pub async fn read_all(&self, collection: &str) -> Result<Vec<Value>, PersistenceError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).await?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(PersistenceError::from))
            .collect()
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<String, PersistenceError> {
        let (id, document) = with_generated_id(document)?;

        fs::create_dir_all(&self.data_dir).await?;
        let path = self.collection_path(collection);
        let mut line = serde_json::to_string(&document)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(collection, id = %id, path = %path.display(), "文档已写入");
        Ok(id)
    }
}

/// 进程内存储，用于测试与不需要落盘的运行
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Value) -> Result<String, PersistenceError> {
        let (id, document) = with_generated_id(document)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }
}

/// 根据配置创建文档存储
pub fn build_document_store(config: &StorageConfig) -> Arc<dyn DocumentStore> {
    match config.backend {
        StorageBackend::File => Arc::new(JsonFileStore::new(config.data_dir.clone())),
        StorageBackend::Memory => Arc::new(InMemoryDocumentStore::new()),
    }
}
