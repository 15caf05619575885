// Integration tests for the HTTP surface: everything that can be exercised
// without a live LLM or embeddings endpoint (health, metrics, validation
// rejections, and the not-found paths that short-circuit before any model
// call).

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use boardsmith_backend::api;
use boardsmith_backend::config::Config;
use boardsmith_backend::store::DesignStore;

fn test_config() -> Config {
    Config {
        port: 0,
        catalog_path: "data/boardgame_catalog.json".into(),
        index_path: "data/catalog_index.json".into(),
        retriever_top_k: 5,
        llm_provider: "openai".into(),
        generate_model: "gpt-4o-mini".into(),
        regenerate_model: "gpt-4o".into(),
        api_key: String::new(),
        embeddings_api_base: "https://api.openai.com/v1".into(),
        embeddings_model: "text-embedding-3-small".into(),
    }
}

/// The app under test: seeded store, no retriever (the catalog index is
/// never built in tests).
fn test_app() -> Router {
    api::router(DesignStore::seeded(), None, test_config())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ── Health and metrics ────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check() {
    let (status, body) = get(test_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["service"], "boardsmith-backend");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let (status, _body) = get(test_app(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}

// ── Concept generation ────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_concept_without_retriever_is_503() {
    let (status, body) = post_json(
        test_app(),
        "/api/plans/generate-concept",
        json!({ "theme": "Medieval fantasy", "playerCount": "2-4 players", "averageWeight": 2.5 }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("retriever"));
}

#[tokio::test]
async fn test_generate_concept_validates_weight_range() {
    for weight in [0.5, 5.1, -1.0] {
        let (status, body) = post_json(
            test_app(),
            "/api/plans/generate-concept",
            json!({ "theme": "t", "playerCount": "2-4 players", "averageWeight": weight }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "weight {weight}");
        assert!(body["error"].as_str().unwrap().contains("averageWeight"));
    }
}

#[tokio::test]
async fn test_generate_concept_requires_theme_and_player_count() {
    let (status, body) = post_json(
        test_app(),
        "/api/plans/generate-concept",
        json!({ "theme": "  ", "playerCount": "2-4 players", "averageWeight": 2.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "theme is required");

    let (status, body) = post_json(
        test_app(),
        "/api/plans/generate-concept",
        json!({ "theme": "t", "playerCount": "", "averageWeight": 2.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "playerCount is required");
}

#[tokio::test]
async fn test_generate_concept_rejects_malformed_body() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/plans/generate-concept")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

// ── Not-found paths (short-circuit before any LLM call) ───────────────

#[tokio::test]
async fn test_regenerate_concept_unknown_id_is_404() {
    let (status, body) = post_json(
        test_app(),
        "/api/plans/regenerate-concept",
        json!({ "conceptId": 9999, "planId": 13, "feedback": "more casual please" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("9999"));
}

#[tokio::test]
async fn test_generate_goal_unknown_concept_is_404() {
    let (status, _body) = post_json(
        test_app(),
        "/api/plans/generate-goal",
        json!({ "conceptId": 777 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_components_unknown_plan_is_404() {
    let (status, body) = post_json(
        test_app(),
        "/api/plans/generate-components",
        json!({ "planId": 31337 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("31337"));
}

#[tokio::test]
async fn test_regenerate_components_unknown_set_is_404() {
    let (status, _body) = post_json(
        test_app(),
        "/api/plans/regenerate-components",
        json!({ "componentId": 1, "feedback": "add more tokens" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_rule_unknown_concept_is_404() {
    let (status, _body) = post_json(
        test_app(),
        "/api/plans/generate-rule",
        json!({ "conceptId": 424242 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regenerate_rule_unknown_id_is_404() {
    let (status, body) = post_json(
        test_app(),
        "/api/plans/regenerate-rule",
        json!({ "ruleId": 555, "feedback": "actions feel samey" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("555"));
}

// ── Simulation and balance ────────────────────────────────────────────

#[tokio::test]
async fn test_simulate_unknown_rule_is_404() {
    let (status, _body) = post_json(
        test_app(),
        "/api/simulate/rule-test",
        json!({ "ruleId": 404404, "playerNames": ["A", "B"], "maxTurns": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_requires_player_names() {
    // Rule 23 is seeded; blank names are filtered before the check
    let (status, body) = post_json(
        test_app(),
        "/api/simulate/rule-test",
        json!({ "ruleId": 23, "playerNames": ["  ", ""], "maxTurns": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "playerNames is required");
}

#[tokio::test]
async fn test_simulate_requires_positive_max_turns() {
    let (status, body) = post_json(
        test_app(),
        "/api/simulate/rule-test",
        json!({ "ruleId": 23, "playerNames": ["Explorer A"], "maxTurns": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("maxTurns"));
}

#[tokio::test]
async fn test_balance_feedback_without_simulation_is_404() {
    let (status, body) = get(test_app(), "/api/feedback/balance").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert!(value["error"]
        .as_str()
        .unwrap()
        .contains("No simulation has been run"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _body) = get(test_app(), "/api/plans/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
