use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::state::Stage;

/// 阶段计时
pub struct StageTimings {
    start_time: Instant,
    stage_start_times: HashMap<Stage, Instant>,
    stage_durations: Vec<(Stage, Duration)>,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimings {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            stage_start_times: HashMap::new(),
            stage_durations: Vec::new(),
        }
    }

    /// 开始一个阶段的计时
    pub fn start_stage(&mut self, stage: Stage) {
        self.stage_start_times.insert(stage, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_stage(&mut self, stage: Stage) -> Option<Duration> {
        let duration = self.stage_start_times.remove(&stage)?.elapsed();
        self.stage_durations.push((stage, duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 已结束的阶段，按结束顺序
    pub fn stage_durations(&self) -> &[(Stage, Duration)] {
        &self.stage_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒\n",
            self.total_duration().as_secs_f64()
        );

        if !self.stage_durations.is_empty() {
            report.push_str("各阶段执行时间:\n");
            for (stage, duration) in &self.stage_durations {
                report.push_str(&format!("- {}: {:.3}秒\n", stage, duration.as_secs_f64()));
            }
        }

        report
    }
}
