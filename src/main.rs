use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use deepsearch_rs::{PipelineError, ResearchReport, cli, launch, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let topic = args.topic.clone();
    let output = args.output.clone();
    let config = args.into_config()?;

    logging::init(config.verbose);

    println!("🔎 开始调研: {}", topic);
    let report = match launch(&config, &topic).await {
        Ok(report) => report,
        Err(err) => match err.downcast::<PipelineError>() {
            Ok(PipelineError::Persistence { report, source }) => {
                eprintln!("⚠️ 警告: 报告已生成，但保存失败: {}", source);
                *report
            }
            Ok(other) => {
                if let Some(stage) = other.failed_stage() {
                    eprintln!("❌ 阶段 {} 执行失败", stage);
                }
                return Err(other.into());
            }
            Err(err) => return Err(err),
        },
    };

    print_report(&report);

    if let Some(path) = output {
        write_report(&report, &path).await?;
        println!("💾 完整报告已写入 {}", path.display());
    }

    Ok(())
}

fn print_report(report: &ResearchReport) {
    println!("\n📝 调研主题: {}", report.topic);
    println!("🧭 检索查询:");
    for query in &report.queries {
        println!("  - {}", query);
    }
    println!("\n{}\n", report.summary);
    println!("🔗 来源 ({}):", report.top_sources.len());
    for (i, source) in report.top_sources.iter().enumerate() {
        println!(
            "  {:>2}. [{:.1}] {} - {}",
            i + 1,
            source.relevance,
            source.title,
            source.url
        );
    }
}

async fn write_report(report: &ResearchReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let content = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write report to {:?}", path))?;
    Ok(())
}
