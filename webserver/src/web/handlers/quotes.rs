//! Quote batch endpoints under `/groups/:id/quotes`

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Json;

use engine::QuoteService;
use shared::{
    service_info, BenchmarkRequest, BenchmarkResponse, FilterOptions, GroupId, MemberQuoteEntry,
    PreviewRequest, QuoteBatch, RunQuotesRequest, ServiceId,
};

use super::parse_body;
use crate::error::{WebServerError, WebServerResult};
use crate::webserver_impl::WebServer;

/// Generate and persist a batch - POST /groups/:id/quotes
pub async fn run_quotes<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
    body: Bytes,
) -> WebServerResult<Json<QuoteBatch>>
where
    Q: QuoteService + 'static,
{
    let request: RunQuotesRequest = parse_body(&body)?;
    let _run = server.state().track_run();

    service_info!(
        ServiceId::current(),
        "🧮 Quote run requested for group {} ({} county choices)",
        group_id,
        request.county_choices.len()
    );
    let batch = server.quotes().generate_batch(&group_id, request).await?;
    Ok(Json(batch))
}

/// Latest batch - GET /groups/:id/quotes
pub async fn latest_quotes<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
) -> WebServerResult<Json<QuoteBatch>>
where
    Q: QuoteService + 'static,
{
    server
        .quotes()
        .latest_batch(&group_id)
        .await?
        .map(Json)
        .ok_or_else(|| WebServerError::NoQuotes {
            group_id: group_id.to_string(),
        })
}

/// All batches, newest first - GET /groups/:id/quotes/history
pub async fn quote_history<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
) -> WebServerResult<Json<Vec<QuoteBatch>>>
where
    Q: QuoteService + 'static,
{
    Ok(Json(server.quotes().batch_history(&group_id).await?))
}

/// One member against one county, not persisted - POST /groups/:id/quotes/preview
pub async fn preview_quotes<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
    body: Bytes,
) -> WebServerResult<Json<MemberQuoteEntry>>
where
    Q: QuoteService + 'static,
{
    let request: PreviewRequest = parse_body(&body)?;
    Ok(Json(server.quotes().preview_member(&group_id, request).await?))
}

/// Benchmark and subsidy breakdown - POST /groups/:id/quotes/benchmark
pub async fn benchmark<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
    body: Bytes,
) -> WebServerResult<Json<BenchmarkResponse>>
where
    Q: QuoteService + 'static,
{
    let request: BenchmarkRequest = parse_body(&body)?;
    Ok(Json(server.quotes().benchmark_for_member(&group_id, request).await?))
}

/// Carriers, levels and markets of the latest batch - GET /groups/:id/quotes/filters
pub async fn filter_options<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
) -> WebServerResult<Json<FilterOptions>>
where
    Q: QuoteService + 'static,
{
    Ok(Json(server.quotes().filter_options(&group_id).await?))
}
