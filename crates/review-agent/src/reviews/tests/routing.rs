use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::reviews::memory::{InMemoryOrganisation, InMemoryReviewStore};
use crate::reviews::router::{counterpart_handler, review_router};
use crate::reviews::scoring::ScoringConfig;
use crate::reviews::service::{Relation, ReviewAgentService};

type Service = ReviewAgentService<InMemoryOrganisation, InMemoryReviewStore, FirstPicker>;

fn build_service() -> (Arc<Service>, Arc<InMemoryReviewStore>) {
    let store = Arc::new(InMemoryReviewStore::default());
    let service = ReviewAgentService::with_picker(
        organisation(treasury_team()),
        Arc::clone(&store),
        Arc::new(FirstPicker),
        ScoringConfig::default(),
    );
    (Arc::new(service), store)
}

fn router() -> (Router, Arc<InMemoryReviewStore>) {
    let (service, store) = build_service();
    (review_router(service), store)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[tokio::test]
async fn counterpart_route_returns_selected_peer() {
    let (router, _) = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/reviews/employees/A001/peer")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["relation"], json!("peer"));
    assert_eq!(payload["employee"]["employee_number"], json!("A002"));
}

#[tokio::test]
async fn counterpart_route_returns_null_when_nobody_qualifies() {
    let (router, _) = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/reviews/employees/A001/superior")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["employee"], Value::Null);
}

#[tokio::test]
async fn counterpart_handler_returns_not_found_for_unknown_employee() {
    let (service, _) = build_service();

    let response = counterpart_handler::<InMemoryOrganisation, InMemoryReviewStore, FirstPicker>(
        State(service),
        Path(("NOPE".to_string(), Relation::Subordinate)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("NOPE"));
}

#[tokio::test]
async fn populate_route_accepts_scoped_requests() {
    let (router, store) = router();

    let response = router
        .oneshot(post_json(
            "/api/v1/reviews/populate",
            json!({ "scope": { "kind": "office", "id": TREASURY_OFFICE } }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["attempted"], json!(5));
    assert_eq!(payload["created"], json!(38));
    assert_eq!(payload["cancelled"], json!(false));
    assert_eq!(store.reviews().expect("store readable").len(), 38);
}

#[tokio::test]
async fn populate_route_defaults_to_the_organisation() {
    let (router, _) = router();

    let response = router
        .oneshot(post_json("/api/v1/reviews/populate", json!({})))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["attempted"], json!(5));
    assert_eq!(payload["period"], json!(PERIOD.0));
}

#[tokio::test]
async fn calculate_and_report_routes_round_out_the_cycle() {
    let (service, store) = build_service();
    service
        .populate(
            &crate::reviews::PopulationScope::Employee(id("A001")),
            &crate::reviews::CancellationFlag::new(),
        )
        .expect("population runs");
    store
        .record_rating(&id("A001"), &id("A001"), INTEGRITY, PERIOD, 2)
        .expect("rating recorded");
    store
        .record_rating(&id("A001"), &id("A002"), TEAMWORK, PERIOD, 3)
        .expect("rating recorded");

    let router = review_router(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/reviews/profiles/A001/7/behavioral",
            json!({}),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["created"], json!(2));

    let response = router
        .oneshot(
            Request::get("/api/v1/reviews/profiles/A001/7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["assessed"], json!(2));
    assert_eq!(payload["with_gap"], json!(1));
    assert_eq!(payload["gaps"][0]["competency_id"], json!(INTEGRITY.0));
}

#[tokio::test]
async fn partial_match_route_reports_scores() {
    let (router, _) = router();

    let response = router
        .oneshot(post_json(
            "/api/v1/reviews/partial-match",
            json!({
                "left": "Finance.Treasury Operations.Senior Accountant",
                "right": "Senior Accountant.Treasury Operations.Senior Accountant",
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["matched"], json!(true));
    assert_eq!(payload["middle_score"], json!(100.0));
}
