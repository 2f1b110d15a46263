use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use complyform_client::{
    ApiError, ClientConfig, ComplyFormClient, FormError, ParticipationForm,
    submit_participation_form,
};
use complyform_client::models::{OrganizationCreateRequest, ValidationStatus};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Bodies posted to the fake service, in arrival order.
type Received = Arc<Mutex<Vec<Value>>>;

async fn add_subcontractor(
    State(received): State<Received>,
    Path(bid_id): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    received.lock().unwrap().push(body.clone());

    match bid_id.as_str() {
        "locked" => (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Bid is already submitted and cannot be modified"})),
        ),
        "strict" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": [
                {"loc": ["body", "category_breakdown"], "msg": "percentages must sum to 100"},
                {"loc": ["body", "subcontract_value"], "msg": "must be positive"}
            ]})),
        ),
        _ => (
            StatusCode::CREATED,
            Json(json!({
                "id": "bs-1",
                "bid_id": bid_id,
                "subcontractor_id": body["subcontractor_id"],
                "work_description": body["work_description"],
                "naics_code": body["naics_code"],
                "subcontract_value": body["subcontract_value"],
                "counts_toward_mbe": body["counts_toward_mbe"]
            })),
        ),
    }
}

async fn remove_subcontractor(Path((_bid_id, sub_id)): Path<(String, String)>) -> impl IntoResponse {
    if sub_id == "missing" {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Bid subcontractor not found"}))).into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn validate_bid(Path(bid_id): Path<String>) -> Json<Value> {
    Json(json!({
        "bid_id": bid_id,
        "overall_status": "FAIL",
        "total_validations": 2,
        "passed": 1,
        "failed": 1,
        "warnings": 0,
        "validations": [
            {
                "id": "v1",
                "bid_id": bid_id,
                "rule_name": "MBE_GOAL_MET",
                "status": "FAIL",
                "error_message": "MBE participation 18.0% is below goal 29.0%",
                "created_at": "2024-05-01T12:00:00"
            },
            {
                "id": "v2",
                "bid_id": bid_id,
                "rule_name": "NAICS_PRESENT",
                "status": "PASS",
                "error_message": "",
                "created_at": "2024-05-01T12:00:00"
            }
        ]
    }))
}

async fn search_subcontractors(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let q = params.get("q").cloned().unwrap_or_default();
    let is_mbe = params.get("is_mbe").map(|v| v == "true").unwrap_or(false);
    Json(json!([{
        "id": "s1",
        "organization_id": "o1",
        "legal_name": format!("{} Contracting", q),
        "certification_number": null,
        "is_mbe": is_mbe
    }]))
}

async fn search_directory(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!([{
        "id": "d1",
        "legal_name": params.get("q").cloned().unwrap_or_default(),
        "is_verified": true,
        "certifications": {"mbe": true, "vsbe": false, "dbe": true},
        "naics_codes": ["238210", "236220"]
    }]))
}

async fn create_organization(Json(body): Json<Value>) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(json!({"id": "org-9", "name": body["name"]})),
    )
}

async fn list_directory(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(0);
    let entries: Vec<Value> = (0..limit.min(3))
        .map(|i| json!({"id": format!("d{}", i), "legal_name": format!("Firm {}", i)}))
        .collect();
    Json(Value::Array(entries))
}

async fn list_bids() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn spawn_service() -> (ComplyFormClient, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));

    let routes = Router::new()
        .route("/bids/", get(list_bids))
        .route("/bids/:bid_id/subcontractors", post(add_subcontractor))
        .route(
            "/bids/:bid_id/subcontractors/:sub_id",
            delete(remove_subcontractor),
        )
        .route("/bids/:bid_id/validate", get(validate_bid))
        .route("/subcontractors/search", get(search_subcontractors))
        .route("/organizations/", post(create_organization))
        .route("/directory/", get(list_directory))
        .route("/directory/search", get(search_directory))
        .with_state(received.clone());
    let app = Router::new().nest("/api/v1", routes);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::development().with_api_base(format!("http://{}/api/v1", addr));
    (ComplyFormClient::new(&config).unwrap(), received)
}

fn electrical_form() -> ParticipationForm {
    ParticipationForm::new("sub-42", "Electrical rough-in", "238210", "125000.50")
}

#[tokio::test]
async fn test_add_subcontractor_posts_normalized_payload() {
    let (client, received) = spawn_service().await;
    let form = electrical_form()
        .add_breakdown_entry("MBE", "30")
        .unwrap()
        .add_breakdown_entry("VSBE", "20")
        .unwrap();

    let outcome = submit_participation_form(&client, "bid-1", &form)
        .await
        .unwrap();
    assert_eq!(outcome.created.bid_id, "bid-1");
    assert!(outcome.created.counts_toward_mbe);

    let bodies = received.lock().unwrap();
    assert_eq!(
        bodies[0],
        json!({
            "subcontractor_id": "sub-42",
            "work_description": "Electrical rough-in",
            "naics_code": "238210",
            "subcontract_value": 125000.5,
            "counts_toward_mbe": true,
            "category_breakdown": [
                {"category": "MBE", "percentage": 30.0},
                {"category": "VSBE", "percentage": 20.0},
                {"category": "Non-MBE", "percentage": 50.0}
            ]
        })
    );
}

#[tokio::test]
async fn test_empty_breakdown_is_sent_as_null() {
    let (client, received) = spawn_service().await;

    submit_participation_form(&client, "bid-1", &electrical_form())
        .await
        .unwrap();

    let bodies = received.lock().unwrap();
    assert_eq!(bodies[0]["category_breakdown"], Value::Null);
    assert_eq!(bodies[0]["counts_toward_mbe"], json!(false));
}

#[tokio::test]
async fn test_server_detail_string_passed_through() {
    let (client, _) = spawn_service().await;

    let err = submit_participation_form(&client, "locked", &electrical_form())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FormError::Server("Bid is already submitted and cannot be modified".to_string())
    );
}

#[tokio::test]
async fn test_server_field_errors_joined() {
    let (client, _) = spawn_service().await;

    let err = submit_participation_form(&client, "strict", &electrical_form())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "body.category_breakdown: percentages must sum to 100, body.subcontract_value: must be positive"
    );
}

#[tokio::test]
async fn test_local_failure_makes_no_request() {
    let (client, received) = spawn_service().await;
    let mut form = electrical_form();
    form.naics_code = "12a456".to_string();

    let err = submit_participation_form(&client, "bid-1", &form)
        .await
        .unwrap_err();
    assert!(err.is_local());
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_subcontractor() {
    let (client, _) = spawn_service().await;

    client.remove_subcontractor("bid-1", "bs-1").await.unwrap();

    let err = client
        .remove_subcontractor("bid-1", "missing")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Bid subcontractor not found");
}

#[tokio::test]
async fn test_validate_bid_decodes_report() {
    let (client, _) = spawn_service().await;

    let report = client.validate_bid("bid-1").await.unwrap();
    assert_eq!(report.overall_status, ValidationStatus::Fail);
    assert_eq!(report.validations[1].status, ValidationStatus::Pass);
    assert_eq!(report.validations.len(), 2);

    let failures: Vec<_> = report.failures().map(|v| v.rule_name.as_str()).collect();
    assert_eq!(failures, ["MBE_GOAL_MET"]);
}

#[tokio::test]
async fn test_ids_with_reserved_characters_stay_in_one_segment() {
    let (client, _) = spawn_service().await;

    let report = client.validate_bid("bid/1?x#y").await.unwrap();
    assert_eq!(report.bid_id, "bid/1?x#y");

    let err = client.get_bid("..").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_search_sends_query_parameters() {
    let (client, _) = spawn_service().await;

    let found = client
        .search_subcontractors(Some("Acme"), Some(true))
        .await
        .unwrap();
    assert_eq!(found[0].legal_name, "Acme Contracting");
    assert!(found[0].is_mbe);

    let directory = client.search_directory("Volt Works").await.unwrap();
    assert_eq!(directory[0].legal_name, "Volt Works");
    assert!(directory[0].is_mbe());
}

#[tokio::test]
async fn test_create_organization_and_list_directory() {
    let (client, _) = spawn_service().await;

    let org = client
        .create_organization(&OrganizationCreateRequest {
            name: "Chesapeake Builders".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(org.id, "org-9");
    assert_eq!(org.name, "Chesapeake Builders");

    let directory = client.list_directory(0, 2).await.unwrap();
    assert_eq!(directory.len(), 2);
    assert!(!directory[1].is_mbe());
}

#[tokio::test]
async fn test_non_json_error_uses_fallback() {
    let (client, _) = spawn_service().await;

    let err = client.list_bids().await.unwrap_err();
    match err {
        ApiError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to load bids");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let config = ClientConfig::development().with_api_base("http://127.0.0.1:1/api/v1");
    let client = ComplyFormClient::new(&config).unwrap();

    let err = submit_participation_form(&client, "bid-1", &electrical_form())
        .await
        .unwrap_err();
    assert!(matches!(err, FormError::Transport(_)));
}
