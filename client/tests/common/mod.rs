//! Fixtures for client tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use client::{ClientResult, QuoteApi, SessionConfig};
use shared::{
    AffordabilitySource, AffordabilitySummary, CountyId, CountySource, GroupId, MemberId, MemberQuoteEntry,
    MemberSnapshot, PreviewRequest, QuoteBatch, QuoteOutcome, RunContext, RunQuotesRequest, ZipCode,
};

pub const GROUP: &str = "g1";
pub const DEKALB: &str = "13089";
pub const FULTON: &str = "13121";

pub fn group_id() -> GroupId {
    GroupId::from(GROUP)
}

pub fn effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Short polls so timeouts are reached quickly
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(5),
        poll_timeout: Duration::from_secs(2),
    }
}

pub fn snapshot(id: &str) -> MemberSnapshot {
    MemberSnapshot {
        id: MemberId::from(id),
        first_name: format!("First-{id}"),
        last_name: format!("Last-{id}"),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15),
        zip_code: ZipCode::parse("30339").ok(),
        tobacco: false,
        county_id: None,
    }
}

pub fn priced(id: &str, county_id: &str) -> MemberQuoteEntry {
    MemberQuoteEntry {
        member: snapshot(id),
        outcome: QuoteOutcome::Priced {
            county_id: CountyId::from(county_id),
            county_source: CountySource::Explicit,
            age: 39,
            tobacco: false,
            affordability: AffordabilitySummary {
                fpl_percent: Some(199.2),
                expected_contribution: Some(49.2),
                benchmark_plan_id: None,
                benchmark_premium: Some(310.0),
                premium_tax_credit: 260.8,
                affordable: Some(false),
                source: AffordabilitySource::Internal,
            },
            quotes: Vec::new(),
        },
    }
}

pub fn needs_county(id: &str, county_ids: &[&str]) -> MemberQuoteEntry {
    MemberQuoteEntry {
        member: snapshot(id),
        outcome: QuoteOutcome::NeedsCounty {
            zip_code: ZipCode::parse("30339").unwrap(),
            county_ids: county_ids.iter().map(|id| CountyId::from(*id)).collect(),
        },
    }
}

pub fn batch(entries: Vec<MemberQuoteEntry>) -> QuoteBatch {
    QuoteBatch {
        id: Uuid::new_v4(),
        group_id: group_id(),
        created_at: Utc::now(),
        run_context: RunContext {
            member_count: entries.len(),
            effective_date: effective_date(),
            tobacco: None,
            county_override: None,
            county_choices: BTreeMap::new(),
        },
        entries,
    }
}

pub fn run_request() -> RunQuotesRequest {
    RunQuotesRequest {
        effective_date: Some(effective_date()),
        ..RunQuotesRequest::default()
    }
}

/// API whose run request takes `delay` to answer
pub struct SlowApi {
    pub delay: Duration,
    pub batch: QuoteBatch,
}

#[async_trait]
impl QuoteApi for SlowApi {
    async fn run_quotes(&self, _group_id: &GroupId, _request: &RunQuotesRequest) -> ClientResult<QuoteBatch> {
        tokio::time::sleep(self.delay).await;
        Ok(self.batch.clone())
    }

    async fn latest_batch(&self, _group_id: &GroupId) -> ClientResult<Option<QuoteBatch>> {
        Ok(None)
    }

    async fn preview(&self, _group_id: &GroupId, request: &PreviewRequest) -> ClientResult<MemberQuoteEntry> {
        let member_id = request.member_id.clone().unwrap_or_else(|| MemberId::from("?"));
        let county_id = request.county_id.clone().unwrap_or_else(|| CountyId::from(FULTON));
        Ok(priced(member_id.as_str(), county_id.as_str()))
    }

    async fn county_names(&self, county_ids: &[CountyId]) -> ClientResult<BTreeMap<CountyId, String>> {
        Ok(county_ids.iter().map(|id| (id.clone(), id.to_string())).collect())
    }
}
