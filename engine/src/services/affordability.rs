//! External affordability providers
//!
//! `HttpAffordabilityProvider` starts an affordability calculation for the
//! member's group, polls it until it completes, then picks the member's row
//! out of the per-member results. A calculation covers the whole group, so
//! its outcome is kept per (run, group, date, plan year, location) and shared
//! by every member of the run. Requests are spaced by a minimum delay and
//! retried with exponential backoff on HTTP 429 and 5xx.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use tokio::sync::{Mutex, OnceCell};
use tokio::time::sleep;
use url::Url;
use uuid::Uuid;

use crate::config::AffordabilityApiConfig;
use crate::error::{EngineError, EngineResult};
use crate::traits::{AffordabilityProvider, AffordabilityRequest, ExternalAffordability, RatingLocation};
use shared::{service_debug, service_warn, GroupId, Member, PlanId, ServiceId};

/// Provider used when no external service is configured
pub struct DisabledAffordabilityProvider;

#[async_trait]
impl AffordabilityProvider for DisabledAffordabilityProvider {
    async fn determine(&self, _request: &AffordabilityRequest) -> EngineResult<Option<ExternalAffordability>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CalculationKey {
    run_id: Uuid,
    group_id: GroupId,
    effective_date: NaiveDate,
    plan_year: i32,
    location: RatingLocation,
}

/// Member rows of a finished calculation, or why there are none
type CalculationOutcome = Result<Arc<Vec<Value>>, String>;

struct CachedCalculation {
    created: Instant,
    outcome: Arc<OnceCell<CalculationOutcome>>,
}

pub struct HttpAffordabilityProvider {
    client: Client,
    config: AffordabilityApiConfig,
    last_request: Mutex<Option<Instant>>,
    calculations: Mutex<HashMap<CalculationKey, CachedCalculation>>,
}

impl HttpAffordabilityProvider {
    pub fn new(config: AffordabilityApiConfig) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EngineError::config(format!("affordability HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            last_request: Mutex::new(None),
            calculations: Mutex::new(HashMap::new()),
        })
    }

    fn location_for(&self, request: &AffordabilityRequest) -> RatingLocation {
        match &self.config.rating_location {
            Some(name) => RatingLocation::Named(name.clone()),
            None => request.rating_location.clone(),
        }
    }

    /// Cell shared by every request of the same run and calculation inputs.
    /// Entries older than `calculation_ttl` are dropped on the way.
    async fn calculation_cell(&self, key: CalculationKey) -> Arc<OnceCell<CalculationOutcome>> {
        let mut calculations = self.calculations.lock().await;
        let ttl = self.config.calculation_ttl;
        calculations.retain(|_, cached| cached.created.elapsed() < ttl);
        let cached = calculations.entry(key).or_insert_with(|| CachedCalculation {
            created: Instant::now(),
            outcome: Arc::new(OnceCell::new()),
        });
        Arc::clone(&cached.outcome)
    }

    /// Start, await and fetch one calculation
    async fn run_calculation(
        &self,
        request: &AffordabilityRequest,
        location: &RatingLocation,
    ) -> EngineResult<Vec<Value>> {
        let calculation_id = self.start_calculation(request, location).await?;
        self.wait_for_completion(&calculation_id).await?;

        let rows = self.member_rows(&calculation_id).await?;
        if rows.is_empty() {
            return Err(EngineError::external("no member results returned"));
        }
        service_debug!(
            ServiceId::current(),
            "📋 Affordability calculation {} returned {} member rows",
            calculation_id,
            rows.len()
        );
        Ok(rows)
    }

    fn endpoint(&self, segments: &[&str]) -> EngineResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| EngineError::config(format!("invalid base URL {}", self.config.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Wait until at least `min_delay` has passed since the previous request
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.config.min_delay {
                sleep(self.config.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Send a request, retrying on 429 and 5xx with doubling backoff
    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> EngineResult<Value> {
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;

        loop {
            self.throttle().await;
            service_debug!(ServiceId::current(), "🌐 Affordability {} {}", method, url.path());

            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header("Vericred-Api-Key", &self.config.api_key)
                .header("Ideon-Api-Key", &self.config.api_key)
                .bearer_auth(&self.config.api_key)
                .header("Accept", "application/json")
                .header("Accept-Version", "v6");
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(EngineError::external)?;
            let status = response.status();

            if status.is_success() {
                return response.json::<Value>().await.map_err(EngineError::external);
            }

            let retriable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retriable && attempt < self.config.max_retries {
                attempt += 1;
                service_warn!(
                    ServiceId::current(),
                    "⏳ Affordability service returned {} (attempt {}), retrying in {}ms",
                    status,
                    attempt,
                    backoff.as_millis()
                );
                sleep(backoff).await;
                backoff = (backoff * 2).min(self.config.max_backoff);
                continue;
            }

            let detail = response.text().await.unwrap_or_default();
            return Err(EngineError::external(format!(
                "{method} {} returned {status}: {detail}",
                url.path()
            )));
        }
    }

    async fn start_calculation(
        &self,
        request: &AffordabilityRequest,
        location: &RatingLocation,
    ) -> EngineResult<String> {
        let payload = start_payload(request.effective_date, request.plan_year, location);

        let url = self.endpoint(&[
            "groups",
            request.group_id.as_str(),
            "ichra_affordability_calculations",
        ])?;
        let started = self.send(Method::POST, url, Some(&payload)).await?;

        calculation_field(&started, "id")
            .and_then(value_to_string)
            .ok_or_else(|| EngineError::external("service did not return a calculation id"))
    }

    async fn wait_for_completion(&self, calculation_id: &str) -> EngineResult<()> {
        let started = Instant::now();
        let url = self.endpoint(&["ichra_affordability_calculations", calculation_id])?;

        while started.elapsed() < self.config.poll_timeout {
            let data = self.send(Method::GET, url.clone(), None).await?;
            let status = calculation_field(&data, "status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_ascii_lowercase();

            match status.as_str() {
                "complete" | "completed" => return Ok(()),
                "failed" => return Err(EngineError::external("affordability calculation failed")),
                _ => sleep(self.config.poll_interval).await,
            }
        }

        Err(EngineError::external(
            "timed out waiting for affordability calculation",
        ))
    }

    async fn member_rows(&self, calculation_id: &str) -> EngineResult<Vec<Value>> {
        let url = self.endpoint(&["ichra_affordability_calculations", calculation_id, "members"])?;
        let payload = self.send(Method::GET, url, None).await?;

        let rows = match payload {
            Value::Array(rows) => rows,
            Value::Object(mut object) => match object.remove("members") {
                Some(Value::Array(rows)) => rows,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(rows)
    }
}

#[async_trait]
impl AffordabilityProvider for HttpAffordabilityProvider {
    async fn determine(&self, request: &AffordabilityRequest) -> EngineResult<Option<ExternalAffordability>> {
        let location = self.location_for(request);
        let cell = self
            .calculation_cell(CalculationKey {
                run_id: request.run_id,
                group_id: request.group_id.clone(),
                effective_date: request.effective_date,
                plan_year: request.plan_year,
                location: location.clone(),
            })
            .await;

        let outcome = cell
            .get_or_init(|| async {
                self.run_calculation(request, &location)
                    .await
                    .map(Arc::new)
                    .map_err(|error| match error {
                        EngineError::ExternalServiceUnavailable { message } => message,
                        other => other.to_string(),
                    })
            })
            .await;

        match outcome {
            Ok(rows) => Ok(select_member_row(rows, &request.member).map(map_member_row)),
            Err(message) => Err(EngineError::external(message.clone())),
        }
    }
}

/// Provider chosen at startup from the environment
pub enum ConfiguredProvider {
    Disabled(DisabledAffordabilityProvider),
    Http(HttpAffordabilityProvider),
}

impl ConfiguredProvider {
    /// HTTP provider when `AFFORDABILITY_API_KEY` is set, disabled otherwise
    pub fn from_env() -> EngineResult<Self> {
        match AffordabilityApiConfig::from_env()? {
            Some(config) => Ok(ConfiguredProvider::Http(HttpAffordabilityProvider::new(config)?)),
            None => Ok(ConfiguredProvider::Disabled(DisabledAffordabilityProvider)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ConfiguredProvider::Http(_))
    }
}

#[async_trait]
impl AffordabilityProvider for ConfiguredProvider {
    async fn determine(&self, request: &AffordabilityRequest) -> EngineResult<Option<ExternalAffordability>> {
        match self {
            ConfiguredProvider::Disabled(provider) => provider.determine(request).await,
            ConfiguredProvider::Http(provider) => provider.determine(request).await,
        }
    }
}

fn start_payload(effective_date: NaiveDate, plan_year: i32, location: &RatingLocation) -> Value {
    json!({
        "ichra_affordability_calculation": {
            "effective_date": effective_date.format("%Y-%m-%d").to_string(),
            "plan_year": plan_year,
            "rating_area_location": location,
        }
    })
}

/// Field of a calculation, whether or not the response wraps it
fn calculation_field<'a>(data: &'a Value, field: &str) -> Option<&'a Value> {
    data.get("ichra_affordability_calculation")
        .and_then(|calculation| calculation.get(field))
        .or_else(|| data.get(field))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Numbers may arrive as JSON numbers or numeric strings
fn value_to_f64(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// Field read either from the row or from its nested `member` object
fn row_text(row: &Value, field: &str) -> String {
    row.get("member")
        .and_then(|member| member.get(field))
        .or_else(|| row.get(field))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// The member's row: external id first, then name and date of birth, then the
/// only row when the calculation returned exactly one
pub fn select_member_row<'a>(rows: &'a [Value], member: &Member) -> Option<&'a Value> {
    if let Some(external_id) = member.external_id.as_deref().filter(|id| !id.is_empty()) {
        let by_external_id = rows.iter().find(|row| {
            row.get("member_external_id").and_then(value_to_string).as_deref() == Some(external_id)
                || row
                    .get("member")
                    .and_then(|m| m.get("external_id"))
                    .and_then(value_to_string)
                    .as_deref()
                    == Some(external_id)
        });
        if by_external_id.is_some() {
            return by_external_id;
        }
    }

    let date_of_birth = member
        .date_of_birth
        .map(|dob| dob.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let first = member.first_name.to_lowercase();
    let last = member.last_name.to_lowercase();

    rows.iter()
        .find(|row| {
            row_text(row, "date_of_birth") == date_of_birth
                && row_text(row, "first_name").to_lowercase() == first
                && row_text(row, "last_name").to_lowercase() == last
        })
        .or(match rows {
            [only] => Some(only),
            _ => None,
        })
}

/// Map a member row; the benchmark falls back to the second listed plan
pub fn map_member_row(row: &Value) -> ExternalAffordability {
    let second_plan = row
        .get("plans")
        .and_then(Value::as_array)
        .and_then(|plans| plans.get(1));

    let benchmark_plan_id = row
        .get("benchmark_plan_id")
        .and_then(value_to_string)
        .or_else(|| second_plan.and_then(|plan| plan.get("id")).and_then(value_to_string))
        .map(PlanId::from);

    let benchmark_premium = value_to_f64(row.get("benchmark_premium"))
        .or_else(|| value_to_f64(second_plan.and_then(|plan| plan.get("premium"))));

    ExternalAffordability {
        premium_tax_credit: value_to_f64(row.get("premium_tax_credit")),
        benchmark_plan_id,
        benchmark_premium,
        fpl_percent: value_to_f64(row.get("fpl_percent")),
        expected_contribution: value_to_f64(row.get("expected_contribution")),
        affordable: row.get("affordable").and_then(Value::as_bool),
    }
}
