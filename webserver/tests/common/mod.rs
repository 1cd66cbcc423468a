//! Shared fixtures and request helpers for webserver tests

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use engine::services::reference_store::{PlanCounty, ZipCounty};
use engine::services::{
    DirectoryData, DisabledAffordabilityProvider, GroupRecord, InMemoryBatchStore, RealMemberDirectory,
    RealReferenceStore, ReferenceData,
};
use engine::{BatchStore, EngineConfig, QuoteEngine, QuoteService};
use shared::{
    County, CountyId, GroupId, IncomeComponents, Member, MemberId, MemberSnapshot, Plan, PlanId, PricingRow,
    QuoteBatch, RunContext, ZipCode,
};
use webserver::WebServer;

pub const GROUP: &str = "g1";
pub const EMPTY_GROUP: &str = "empty";
pub const FULTON: &str = "13121";
pub const DEKALB: &str = "13089";
/// Fulton only
pub const SINGLE_COUNTY_ZIP: &str = "30301";
/// Fulton and DeKalb
pub const MULTI_COUNTY_ZIP: &str = "30339";

pub fn effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

pub fn bind_address() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// Builder methods for small reference datasets
pub trait ReferenceDataBuilder: Sized {
    fn with_plan(self, plan: Plan, county_ids: &[&str]) -> Self;
    fn with_price(self, plan_id: &str, age: u32, tobacco: bool, premium: f64) -> Self;
    fn with_zip(self, zip_code: ZipCode, county_id: &str) -> Self;
    fn with_county(self, county_id: &str, name: &str, state_code: &str) -> Self;
    fn into_store(self) -> RealReferenceStore;
}

impl ReferenceDataBuilder for ReferenceData {
    fn with_plan(mut self, plan: Plan, county_ids: &[&str]) -> Self {
        for county_id in county_ids {
            self.plan_counties.push(PlanCounty {
                plan_id: plan.id.clone(),
                county_id: CountyId::from(*county_id),
            });
        }
        self.plans.push(plan);
        self
    }

    fn with_price(mut self, plan_id: &str, age: u32, tobacco: bool, premium: f64) -> Self {
        self.pricing.push(PricingRow {
            plan_id: PlanId::from(plan_id),
            age,
            tobacco,
            premium,
        });
        self
    }

    fn with_zip(mut self, zip_code: ZipCode, county_id: &str) -> Self {
        self.zip_counties.push(ZipCounty {
            zip_code,
            county_id: CountyId::from(county_id),
        });
        self
    }

    fn with_county(mut self, county_id: &str, name: &str, state_code: &str) -> Self {
        self.counties.push(County {
            id: CountyId::from(county_id),
            name: name.to_string(),
            state_code: Some(state_code.to_string()),
        });
        self
    }

    fn into_store(self) -> RealReferenceStore {
        RealReferenceStore::from_data(self)
    }
}

/// Plan record with placeholder display fields
pub fn sample_plan(id: &str, carrier: &str, metal_level: &str, on_market: bool) -> Plan {
    Plan {
        id: PlanId::from(id),
        carrier: carrier.to_string(),
        display_name: format!("{carrier} {metal_level} {id}"),
        plan_type: Some("HMO".to_string()),
        metal_level: metal_level.to_string(),
        on_market,
        network_name: None,
        summary_url: None,
    }
}

/// Three on-market silver plans and one gold plan, priced for age 39.
/// SLCSP is S3 at 310.
pub fn reference_data() -> ReferenceData {
    let counties = [FULTON, DEKALB];
    ReferenceData::default()
        .with_county(FULTON, "Fulton", "GA")
        .with_county(DEKALB, "DeKalb", "GA")
        .with_zip(ZipCode::parse(SINGLE_COUNTY_ZIP).unwrap(), FULTON)
        .with_zip(ZipCode::parse(MULTI_COUNTY_ZIP).unwrap(), FULTON)
        .with_zip(ZipCode::parse(MULTI_COUNTY_ZIP).unwrap(), DEKALB)
        .with_plan(sample_plan("S1", "Acme", "Silver", true), &counties)
        .with_plan(sample_plan("S2", "Beta", "Silver", true), &counties)
        .with_plan(sample_plan("S3", "Gamma", "Silver", true), &counties)
        .with_plan(sample_plan("G1", "Acme", "Gold", true), &counties)
        .with_price("S1", 39, false, 320.0)
        .with_price("S2", 39, false, 305.0)
        .with_price("S3", 39, false, 310.0)
        .with_price("G1", 39, false, 450.0)
}

pub fn member(id: &str, zip: &str) -> Member {
    Member {
        id: MemberId::from(id),
        first_name: format!("First-{id}"),
        last_name: format!("Last-{id}"),
        external_id: None,
        date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 15),
        zip_code: ZipCode::parse(zip).ok().into(),
        tobacco: false,
        county_id: None,
        household_size: 1,
        income: IncomeComponents {
            adjusted_gross_income: 30_000.0,
            ..IncomeComponents::default()
        },
        tax_year: Some(2024),
        state_code: Some("GA".to_string()),
        old_employee_contribution: 0.0,
    }
}

/// m1 resolves to Fulton, m2 needs a county choice
pub fn directory() -> RealMemberDirectory {
    RealMemberDirectory::from_data(DirectoryData {
        groups: vec![
            GroupRecord {
                id: GroupId::from(GROUP),
                name: "Test Group".to_string(),
                members: vec![member("m1", SINGLE_COUNTY_ZIP), member("m2", MULTI_COUNTY_ZIP)],
            },
            GroupRecord {
                id: GroupId::from(EMPTY_GROUP),
                name: "Empty Group".to_string(),
                members: Vec::new(),
            },
        ],
    })
}

pub type TestEngine<B> = QuoteEngine<RealReferenceStore, RealMemberDirectory, B, DisabledAffordabilityProvider>;

pub fn engine_with_store<B: BatchStore + 'static>(store: B) -> TestEngine<B> {
    QuoteEngine::new(
        reference_data().into_store(),
        directory(),
        store,
        DisabledAffordabilityProvider,
        EngineConfig::default().with_max_concurrency(2),
    )
}

pub fn engine() -> TestEngine<InMemoryBatchStore> {
    engine_with_store(InMemoryBatchStore::new())
}

pub fn router<Q: QuoteService + 'static>(quotes: Q) -> Router {
    WebServer::new(bind_address(), quotes).build_router()
}

pub fn snapshot(id: &str) -> MemberSnapshot {
    MemberSnapshot::from(&member(id, SINGLE_COUNTY_ZIP))
}

/// Batch with no entries, created at the given minute past midnight
pub fn empty_batch(group_id: &str, minute: u32) -> QuoteBatch {
    QuoteBatch {
        id: Uuid::new_v4(),
        group_id: GroupId::from(group_id),
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap(),
        entries: Vec::new(),
        run_context: RunContext {
            member_count: 0,
            effective_date: effective_date(),
            tobacco: None,
            county_override: None,
            county_choices: Default::default(),
        },
    }
}

pub fn county(id: &str) -> CountyId {
    CountyId::from(id)
}

/// Send one request through the router and decode the JSON response
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = body.map(|value| value.to_string()).unwrap_or_default();
    send_raw(router, method, uri, &body).await
}

pub async fn send_raw(router: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}
