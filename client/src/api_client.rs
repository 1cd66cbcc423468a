//! HTTP client for the quote API
//!
//! `QuoteApi` is the seam the resolution session talks through;
//! `HttpQuoteApi` implements it over reqwest.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ClientError, ClientResult};
use shared::{
    service_debug, CountyId, ErrorBody, GroupId, MemberQuoteEntry, PreviewRequest, QuoteBatch,
    RunQuotesRequest, ServiceId,
};

/// Quote endpoints used by the resolution protocol
#[mockall::automock]
#[async_trait]
pub trait QuoteApi: Send + Sync {
    /// Generate and persist a new batch
    async fn run_quotes(&self, group_id: &GroupId, request: &RunQuotesRequest) -> ClientResult<QuoteBatch>;

    /// Latest batch, `None` when the group has none yet
    async fn latest_batch(&self, group_id: &GroupId) -> ClientResult<Option<QuoteBatch>>;

    /// Price one member against one county without persisting
    async fn preview(&self, group_id: &GroupId, request: &PreviewRequest) -> ClientResult<MemberQuoteEntry>;

    /// Display names by county id
    async fn county_names(&self, county_ids: &[CountyId]) -> ClientResult<BTreeMap<CountyId, String>>;
}

pub struct HttpQuoteApi {
    base_url: Url,
    client: Client,
}

impl HttpQuoteApi {
    /// `server` may omit the scheme, e.g. `127.0.0.1:8080`
    pub fn new(server: &str, timeout: Duration) -> ClientResult<Self> {
        let base_url = if server.starts_with("http") {
            Url::parse(server)?
        } else {
            Url::parse(&format!("http://{server}"))?
        };
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        service_debug!(ServiceId::current(), "🌐 {} {}", method, url);
        self.client.request(method, url).header("Accept", "application/json")
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let bytes = response.bytes().await?;
        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .map(|body| body.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).trim().to_string());
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl QuoteApi for HttpQuoteApi {
    async fn run_quotes(&self, group_id: &GroupId, request: &RunQuotesRequest) -> ClientResult<QuoteBatch> {
        let url = self.endpoint(&["groups", group_id.as_str(), "quotes"])?;
        let response = self.request(Method::POST, url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn latest_batch(&self, group_id: &GroupId) -> ClientResult<Option<QuoteBatch>> {
        let url = self.endpoint(&["groups", group_id.as_str(), "quotes"])?;
        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    async fn preview(&self, group_id: &GroupId, request: &PreviewRequest) -> ClientResult<MemberQuoteEntry> {
        let url = self.endpoint(&["groups", group_id.as_str(), "quotes", "preview"])?;
        let response = self.request(Method::POST, url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn county_names(&self, county_ids: &[CountyId]) -> ClientResult<BTreeMap<CountyId, String>> {
        if county_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        let ids = county_ids.iter().map(CountyId::as_str).collect::<Vec<_>>().join(",");
        let mut url = self.endpoint(&["counties"])?;
        url.query_pairs_mut().append_pair("ids", &ids);

        let response = self.request(Method::GET, url).send().await?;
        Self::decode(response).await
    }
}
