//! County lookup - GET /counties?zip=ZIP or GET /counties?ids=a,b

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use engine::QuoteService;
use shared::{CountyId, ZipCode};

use crate::error::{WebServerError, WebServerResult};
use crate::webserver_impl::WebServer;

#[derive(Debug, Default, Deserialize)]
pub struct CountiesQuery {
    pub zip: Option<String>,
    /// Comma-separated county ids
    pub ids: Option<String>,
}

/// Candidate counties for a ZIP, or display names for a list of ids
pub async fn counties<Q>(
    State(server): State<WebServer<Q>>,
    Query(query): Query<CountiesQuery>,
) -> WebServerResult<Response>
where
    Q: QuoteService + 'static,
{
    if let Some(zip) = query.zip {
        let zip_code = ZipCode::parse(&zip)?;
        let candidates = server.quotes().counties_for_zip(&zip_code).await?;
        return Ok(Json(candidates).into_response());
    }

    if let Some(ids) = query.ids {
        let county_ids: Vec<CountyId> = ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(CountyId::from)
            .collect();
        let names = server.quotes().county_names(county_ids).await?;
        return Ok(Json(names).into_response());
    }

    Err(WebServerError::invalid("either the zip or the ids query parameter is required"))
}
