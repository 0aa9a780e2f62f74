use anyhow::Result;

use crate::config::Config;
use crate::llm::LLMClient;
use crate::types::ResearchReport;

pub mod context;
pub mod orchestrator;
pub mod stages;
pub mod state;
pub mod timing;

pub use context::{PipelineSettings, ResearchContext};
pub use orchestrator::PipelineOrchestrator;
pub use state::{ResearchState, STAGES, Stage, StateUpdate};
pub use timing::StageTimings;

/// 按配置启动一次调研
pub async fn launch(config: &Config, topic: &str) -> Result<ResearchReport> {
    config.validate()?;

    // 启动时检查模型连接
    LLMClient::new(config.llm.clone())?.check_connection().await?;

    let orchestrator = PipelineOrchestrator::new(ResearchContext::from_config(config)?);
    Ok(orchestrator.run(topic).await?)
}
