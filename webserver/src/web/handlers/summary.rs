//! Employee cost comparison - GET|POST /groups/:id/summary/employees

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::Deserialize;

use engine::QuoteService;
use shared::{
    parse_filter_list, parse_market_flag, service_info, EmployeeSummary, EmployeeSummaryRequest, GroupId,
    ServiceId, SummaryFilters,
};

use super::parse_body;
use crate::error::WebServerResult;
use crate::webserver_impl::WebServer;

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// Comma-separated carrier names
    pub carrier: Option<String>,
    /// Comma-separated metal levels
    pub level: Option<String>,
    /// `true`, `false` or `any`
    pub on_market: Option<String>,
}

impl From<SummaryQuery> for SummaryFilters {
    fn from(query: SummaryQuery) -> Self {
        SummaryFilters {
            carrier: query.carrier.as_deref().map(parse_filter_list).unwrap_or_default(),
            level: query.level.as_deref().map(parse_filter_list).unwrap_or_default(),
            on_market: query.on_market.as_deref().and_then(parse_market_flag),
        }
    }
}

/// Filters come from the query string and the body; body fields win where set
pub async fn employee_summary<Q>(
    State(server): State<WebServer<Q>>,
    Path(group_id): Path<GroupId>,
    Query(query): Query<SummaryQuery>,
    body: Bytes,
) -> WebServerResult<Json<EmployeeSummary>>
where
    Q: QuoteService + 'static,
{
    let mut request: EmployeeSummaryRequest = parse_body(&body)?;
    request.filters = request.filters.or(SummaryFilters::from(query));

    service_info!(
        ServiceId::current(),
        "📊 Employee summary requested for group {} ({} selections)",
        group_id,
        request.selected.len()
    );
    Ok(Json(server.quotes().employee_summary(&group_id, request).await?))
}
