pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod planner;
pub mod search;
pub mod storage;
pub mod synthesis;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use pipeline::{PipelineOrchestrator, ResearchContext, launch};
pub use types::ResearchReport;
