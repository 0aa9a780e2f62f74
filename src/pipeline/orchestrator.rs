use tracing::{info, warn};

use crate::error::PipelineError;
use crate::types::ResearchReport;

use super::context::ResearchContext;
use super::stages::run_stage;
use super::state::{ResearchState, STAGES};
use super::timing::StageTimings;

/// 调研流水线编排器：按固定顺序执行各阶段，任一阶段失败即中止，不做阶段级重试
pub struct PipelineOrchestrator {
    ctx: ResearchContext,
}

impl PipelineOrchestrator {
    pub fn new(ctx: ResearchContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ResearchContext {
        &self.ctx
    }

    pub async fn run(&self, topic: &str) -> Result<ResearchReport, PipelineError> {
        if topic.trim().is_empty() {
            return Err(PipelineError::InvalidTopic(
                "topic must not be empty".to_string(),
            ));
        }

        info!(topic, "开始调研");
        let mut state = ResearchState::new(topic);
        let mut timings = StageTimings::new();

        for stage in STAGES {
            timings.start_stage(stage);
            let update = match run_stage(stage, &self.ctx, &state).await {
                Ok(update) => update,
                Err(e) => {
                    warn!(stage = %stage, error = %e, "阶段执行失败，调研中止");
                    return Err(e);
                }
            };
            state.apply(update);

            if let Some(duration) = timings.end_stage(stage) {
                info!(stage = %stage, elapsed_ms = duration.as_millis() as u64, "阶段完成");
            }
        }

        info!(
            topic,
            record_id = state.record_id.as_deref().unwrap_or_default(),
            "调研完成\n{}",
            timings.generate_timing_report()
        );
        Ok(state.into_report())
    }
}
