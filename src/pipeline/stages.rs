//! 各阶段的实现：读取累积状态，返回局部更新

use tracing::{info, warn};

use crate::aggregate::{aggregate, collect_sources};
use crate::error::{PipelineError, StageError};
use crate::index::namespace_for_topic;
use crate::types::{IndexedContentItem, ResearchRecord};

use super::context::ResearchContext;
use super::state::{ResearchState, Stage, StateUpdate};

/// 执行指定阶段，失败时标注阶段名
pub async fn run_stage(
    stage: Stage,
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, PipelineError> {
    let outcome = match stage {
        Stage::GenerateQueries => generate_queries(ctx, state).await,
        Stage::Search => search(ctx, state).await,
        Stage::Filter => filter(ctx, state).await,
        Stage::Summarize => summarize(ctx, state).await,
        Stage::Save => return save(ctx, state).await,
    };
    outcome.map_err(|e| PipelineError::stage(stage, e))
}

pub async fn generate_queries(
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, StageError> {
    let queries = ctx.planner.plan(&state.topic).await?;
    Ok(StateUpdate {
        queries: Some(queries),
        ..Default::default()
    })
}

pub async fn search(
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, StageError> {
    let mut executor = ctx.search.lock().await;
    let search_results = executor.run(&state.queries).await?;

    let stats = executor.cache_stats();
    info!(
        queries = state.queries.len(),
        cache_hits = stats.hits,
        cache_entries = stats.entries,
        "搜索阶段完成"
    );
    Ok(StateUpdate {
        search_results: Some(search_results),
        ..Default::default()
    })
}

/// 索引全部原始结果，以主题本身为查询做语义检索，再按查询聚合。
/// 无论成功与否，结束时都会清空本次使用的命名空间。
/// 同一命名空间同时只有一个筛选在执行。
pub async fn filter(
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, StageError> {
    let namespace = namespace_for_topic(&state.topic);

    let items: Vec<IndexedContentItem> = state
        .search_results
        .iter()
        .enumerate()
        .flat_map(|(qi, result)| {
            result.results.iter().enumerate().map(move |(ri, item)| {
                IndexedContentItem::from_result_item(
                    format!("{}-{}", qi, ri),
                    item,
                    &result.query,
                    &result.summary,
                )
            })
        })
        .collect();

    // 同一主题的并发运行共用命名空间，整个写入-检索-清理过程独占执行
    let _lease = ctx.index.lock_namespace(&namespace).await;
    let matches = async {
        ctx.index.add_batch(&namespace, items).await?;
        ctx.index
            .search(&namespace, &state.topic, None, ctx.settings.filter_limit)
            .await
    }
    .await;
    ctx.index.clear_namespace(&namespace).await;
    let matches = matches?;

    let aggregated = aggregate(&state.topic, &state.search_results, &matches);
    info!(
        namespace = %namespace,
        matches = matches.len(),
        groups = aggregated.len(),
        "语义筛选完成"
    );
    Ok(StateUpdate {
        aggregated: Some(aggregated),
        ..Default::default()
    })
}

pub async fn summarize(
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, StageError> {
    let summary = ctx
        .synthesizer
        .synthesize(&state.topic, &state.queries, &state.aggregated)
        .await?;
    let top_sources = collect_sources(&state.aggregated, ctx.settings.max_sources);

    Ok(StateUpdate {
        summary: Some(summary),
        top_sources: Some(top_sources),
        ..Default::default()
    })
}

/// 定稿报告并写入文档存储；写入失败时错误中携带完整报告
pub async fn save(
    ctx: &ResearchContext,
    state: &ResearchState,
) -> Result<StateUpdate, PipelineError> {
    let report = state.build_report();
    let record = ResearchRecord::from(&report);

    let inserted = match serde_json::to_value(&record) {
        Ok(document) => ctx.store.insert(&ctx.settings.collection, document).await,
        Err(e) => Err(e.into()),
    };

    match inserted {
        Ok(record_id) => Ok(StateUpdate {
            report: Some(report),
            record_id: Some(record_id),
            ..Default::default()
        }),
        Err(source) => {
            warn!(error = %source, "报告保存失败");
            Err(PipelineError::Persistence {
                report: Box::new(report),
                source,
            })
        }
    }
}
