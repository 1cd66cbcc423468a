//! Tests for the HTTP affordability provider against a mock server

use std::time::Duration;

use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{date, test_member};
use crate::config::AffordabilityApiConfig;
use crate::services::affordability::{
    map_member_row, select_member_row, DisabledAffordabilityProvider, HttpAffordabilityProvider,
};
use crate::traits::{AffordabilityProvider, AffordabilityRequest, RatingLocation};
use shared::{GroupId, PlanId, ZipCode};

fn fast_config(server: &MockServer) -> AffordabilityApiConfig {
    let mut config = AffordabilityApiConfig::new("test-key", Url::parse(&server.uri()).unwrap());
    config.min_delay = Duration::ZERO;
    config.initial_backoff = Duration::from_millis(1);
    config.max_backoff = Duration::from_millis(4);
    config.poll_interval = Duration::from_millis(1);
    config.poll_timeout = Duration::from_secs(2);
    config
}

fn request() -> AffordabilityRequest {
    let mut member = test_member("m1", "Ada", "Lovelace");
    member.external_id = Some("ext-1".to_string());
    AffordabilityRequest {
        run_id: Uuid::new_v4(),
        group_id: GroupId::from("g1"),
        member,
        effective_date: date(2025, 1, 1),
        plan_year: 2025,
        rating_location: RatingLocation::Zip {
            zip_code: ZipCode::parse("30301").unwrap(),
        },
    }
}

async fn mount_start(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .and(header("Ideon-Api-Key", "test-key"))
        .and(header("Accept-Version", "v6"))
        .and(body_partial_json(json!({
            "ichra_affordability_calculation": {
                "effective_date": "2025-01-01",
                "plan_year": 2025,
                "rating_area_location": {"zip_code": "30301"}
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ichra_affordability_calculation": {"id": "calc-1", "status": "pending"}})),
        )
        .mount(server)
        .await;
}

async fn mount_members(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_determine_full_flow() {
    // Arrange
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "running"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "COMPLETE"})))
        .mount(&server)
        .await;
    mount_members(
        &server,
        json!({"members": [
            {"member_external_id": "other", "premium_tax_credit": 1.0},
            {"member_external_id": "ext-1", "premium_tax_credit": "412.50",
             "benchmark_plan_id": "P2", "benchmark_premium": 480.0, "affordable": false}
        ]}),
    )
    .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    // Act
    let result = provider.determine(&request()).await.unwrap().unwrap();

    // Assert
    assert_eq!(result.premium_tax_credit, Some(412.5));
    assert_eq!(result.benchmark_plan_id, Some(PlanId::from("P2")));
    assert_eq!(result.benchmark_premium, Some(480.0));
    assert_eq!(result.affordable, Some(false));
}

#[tokio::test]
async fn test_retries_rate_limit_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "completed"})))
        .mount(&server)
        .await;
    mount_members(&server, json!([{"premium_tax_credit": 100}])).await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    let result = provider.determine(&request()).await.unwrap().unwrap();

    assert_eq!(result.premium_tax_credit, Some(100.0));
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    let error = provider.determine(&request()).await.unwrap_err();

    assert!(error.to_string().contains("503"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    let error = provider.determine(&request()).await.unwrap_err();

    assert!(error.to_string().contains("bad key"));
}

#[tokio::test]
async fn test_failed_calculation_is_an_error() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "failed"})))
        .mount(&server)
        .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    let error = provider.determine(&request()).await.unwrap_err();

    assert!(error.to_string().contains("failed"));
}

#[tokio::test]
async fn test_empty_member_results_is_an_error() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "complete"})))
        .mount(&server)
        .await;
    mount_members(&server, json!({"members": []})).await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    assert!(provider.determine(&request()).await.is_err());
}

#[tokio::test]
async fn test_named_rating_location_overrides_zip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .and(body_partial_json(json!({
            "ichra_affordability_calculation": {"rating_area_location": "work"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 77})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "complete"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/77/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"premium_tax_credit": 5}])))
        .mount(&server)
        .await;
    let mut config = fast_config(&server);
    config.rating_location = Some("work".to_string());
    let provider = HttpAffordabilityProvider::new(config).unwrap();

    let result = provider.determine(&request()).await.unwrap().unwrap();

    assert_eq!(result.premium_tax_credit, Some(5.0));
}

async fn mount_complete(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ichra_affordability_calculations/calc-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "complete"})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_one_calculation_per_run() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "calc-1"})))
        .expect(2)
        .mount(&server)
        .await;
    mount_complete(&server).await;
    mount_members(
        &server,
        json!([
            {"member_external_id": "ext-1", "premium_tax_credit": 100},
            {"member_external_id": "ext-2", "premium_tax_credit": 200}
        ]),
    )
    .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();
    let first = request();
    let mut second = first.clone();
    second.member = test_member("m2", "Grace", "Hopper");
    second.member.external_id = Some("ext-2".to_string());
    let mut next_run = first.clone();
    next_run.run_id = Uuid::new_v4();

    // Act
    let (a, b) = tokio::join!(provider.determine(&first), provider.determine(&second));
    let c = provider.determine(&next_run).await.unwrap().unwrap();

    // Assert
    assert_eq!(a.unwrap().unwrap().premium_tax_credit, Some(100.0));
    assert_eq!(b.unwrap().unwrap().premium_tax_credit, Some(200.0));
    assert_eq!(c.premium_tax_credit, Some(100.0));
}

#[tokio::test]
async fn test_failed_calculation_is_shared_within_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groups/g1/ichra_affordability_calculations"))
        .respond_with(ResponseTemplate::new(400).set_body_string("group unknown"))
        .expect(1)
        .mount(&server)
        .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();
    let first = request();
    let mut second = first.clone();
    second.member = test_member("m2", "Grace", "Hopper");

    let a = provider.determine(&first).await.unwrap_err();
    let b = provider.determine(&second).await.unwrap_err();

    assert!(a.to_string().contains("group unknown"));
    assert_eq!(a.to_string(), b.to_string());
}

#[tokio::test]
async fn test_unmatched_member_among_several_rows_has_nothing() {
    let server = MockServer::start().await;
    mount_start(&server).await;
    mount_complete(&server).await;
    mount_members(
        &server,
        json!([
            {"member_external_id": "EXT-GRACE", "premium_tax_credit": 999},
            {"member_external_id": "EXT-ALAN", "premium_tax_credit": 5}
        ]),
    )
    .await;
    let provider = HttpAffordabilityProvider::new(fast_config(&server)).unwrap();

    let result = provider.determine(&request()).await.unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_disabled_provider_has_nothing() {
    let provider = DisabledAffordabilityProvider;
    assert!(provider.determine(&request()).await.unwrap().is_none());
}

#[test]
fn test_select_member_row_by_name_and_birth_date() {
    let member = test_member("m1", "Ada", "Lovelace");
    let rows = vec![
        json!({"member": {"first_name": "Grace", "last_name": "Hopper", "date_of_birth": "1985-06-15"}}),
        json!({"member": {"first_name": "ADA", "last_name": "lovelace", "date_of_birth": "1985-06-15"}, "premium_tax_credit": 9}),
    ];

    let row = select_member_row(&rows, &member).unwrap();

    assert_eq!(row["premium_tax_credit"], json!(9));
}

#[test]
fn test_select_member_row_falls_back_to_sole_row_only() {
    // Arrange
    let mut member = test_member("m1", "Ada", "Lovelace");
    member.external_id = Some("EXT-ADA".to_string());
    let sole = vec![json!({"member_external_id": "EXT-GRACE", "premium_tax_credit": 1})];
    let others = vec![
        json!({"member_external_id": "EXT-GRACE", "premium_tax_credit": 999}),
        json!({"member_external_id": "EXT-ALAN", "premium_tax_credit": 5}),
    ];

    // Act & Assert
    let row = select_member_row(&sole, &member).unwrap();
    assert_eq!(row["premium_tax_credit"], json!(1));
    assert!(select_member_row(&others, &member).is_none());
    assert!(select_member_row(&[], &member).is_none());
}

#[test]
fn test_map_member_row_uses_second_plan_as_benchmark() {
    let row = json!({
        "premium_tax_credit": 250.0,
        "plans": [
            {"id": "P1", "premium": 300.0},
            {"id": "P2", "premium": "320.25"},
            {"id": "P3", "premium": 340.0}
        ]
    });

    let mapped = map_member_row(&row);

    assert_eq!(mapped.benchmark_plan_id, Some(PlanId::from("P2")));
    assert_eq!(mapped.benchmark_premium, Some(320.25));
    assert_eq!(mapped.fpl_percent, None);
}

#[test]
fn test_map_member_row_ignores_non_numeric_values() {
    let mapped = map_member_row(&json!({"premium_tax_credit": "n/a", "fpl_percent": null}));
    assert_eq!(mapped.premium_tax_credit, None);
    assert_eq!(mapped.fpl_percent, None);
}
