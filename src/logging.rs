//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 日志过滤环境变量
pub const LOG_ENV: &str = "DEEPSEARCH_LOG";

/// 默认过滤规则，`verbose` 时提升到 debug
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "deepsearch_rs=debug"
    } else {
        "deepsearch_rs=info"
    }
}

/// 安装全局 tracing 订阅者，优先读取 `DEEPSEARCH_LOG`。
/// 重复调用时保留第一次安装的订阅者。
pub fn init(verbose: bool) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
