//! 嵌入模型协作方

use anyhow::Result;
use async_trait::async_trait;
use rig::client::EmbeddingsClient;
use rig::embeddings::EmbeddingModel;
use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProvider};

/// 文本嵌入：同一文本总是得到同一向量，维度固定
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// 基于 rig-core 嵌入模型的实现
pub struct RigEmbedder<M> {
    model: M,
    dimensions: usize,
}

impl<M> RigEmbedder<M> {
    pub fn new(model: M, dimensions: usize) -> Self {
        Self { model, dimensions }
    }
}

#[async_trait]
impl<M> Embedder for RigEmbedder<M>
where
    M: EmbeddingModel + Send + Sync,
{
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.model.embed_text(text).await?;
        Ok(embedding.vec.into_iter().map(|v| v as f32).collect())
    }
}

/// 根据配置创建嵌入模型
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::OpenAI => {
            let client = rig::providers::openai::Client::builder(&config.api_key)
                .base_url(&config.api_base_url)
                .build();
            let model = client.embedding_model_with_ndims(&config.model, config.dimensions);
            Arc::new(RigEmbedder::new(model, config.dimensions))
        }
        EmbeddingProvider::Ollama => {
            let client = rig::providers::ollama::Client::builder()
                .base_url(&config.api_base_url)
                .build();
            let model = client.embedding_model_with_ndims(&config.model, config.dimensions);
            Arc::new(RigEmbedder::new(model, config.dimensions))
        }
    };
    Ok(embedder)
}
