// Integration tests for the read-only catalog endpoints, driven through the
// router against a seeded in-memory database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use siege_guide::api::{self, AppState};
use siege_guide::db::Database;
use siege_guide::rate_limit::RateLimiter;
use siege_guide::seed::CatalogSeed;

async fn seeded_db() -> Database {
    let db = Database::new("sqlite::memory:").await.unwrap();
    let seed = CatalogSeed::from_json(include_str!("../data/catalog.json")).unwrap();
    db.seed(&seed).await.unwrap();
    db
}

async fn app() -> Router {
    api::router(AppState {
        db: Arc::new(seeded_db().await),
        suggestions: None,
        rate_limiter: RateLimiter::per_hour(0),
        suggestion_count: 3,
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|v| v["name"].as_str().unwrap().to_string())
        .collect()
}

// ── Health ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_reports_llm_disabled() {
    let (status, body) = get(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["llm_enabled"], false);
}

// ── Operators ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_operators_grouped_by_side() {
    let (status, body) = get(app().await, "/api/operators").await;
    assert_eq!(status, StatusCode::OK);

    let attackers = names(&body["attackers"]);
    let defenders = names(&body["defenders"]);
    assert_eq!(attackers.len(), 10);
    assert_eq!(defenders.len(), 10);
    assert!(attackers.contains(&"Ash".to_string()));
    assert!(defenders.contains(&"Jäger".to_string()));

    let mut sorted = attackers.clone();
    sorted.sort();
    assert_eq!(attackers, sorted);
}

#[tokio::test]
async fn test_operators_filtered_by_side() {
    let (status, body) = get(app().await, "/api/operators?side=defender").await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 10);
    assert!(list.iter().all(|op| op["side"] == "Defender"));
}

#[tokio::test]
async fn test_operators_unknown_side_rejected() {
    let (status, body) = get(app().await, "/api/operators?side=Spectator").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Spectator"));
}

#[tokio::test]
async fn test_operator_detail_by_slug() {
    let (status, body) = get(app().await, "/api/operators/thermite").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Thermite");
    assert_eq!(body["slug"], "thermite");
    assert!(body["secondary_gadgets_list"].is_array());
    assert!(body["synergy_list"].as_array().unwrap().len() > 0);
}

#[tokio::test]
async fn test_operator_detail_non_ascii_slug() {
    let (status, body) = get(app().await, "/api/operators/j%C3%A4ger").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jäger");
}

#[tokio::test]
async fn test_operator_detail_missing() {
    let (status, body) = get(app().await, "/api/operators/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Operator 'nobody' not found.");
}

#[tokio::test]
async fn test_map_detail_missing() {
    let (status, body) = get(app().await, "/api/maps/atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Map 'atlantis' not found.");
}

// ── Search ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_is_case_insensitive_substring() {
    let (status, body) = get(app().await, "/api/search?query=ash").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Ash"]);

    let (_, body) = get(app().await, "/api/search?query=TH").await;
    let found = names(&body);
    assert!(found.contains(&"Thatcher".to_string()));
    assert!(found.contains(&"Thermite".to_string()));
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    for query in ["j%C3%A4g", "J%C3%84G"] {
        let (status, body) = get(app().await, &format!("/api/search?query={query}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body), vec!["Jäger"], "{query}");
    }
}

#[tokio::test]
async fn test_search_blank_query_is_empty() {
    let (status, body) = get(app().await, "/api/search?query=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = get(app().await, "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_wildcards_are_literal() {
    let (_, body) = get(app().await, "/api/search?query=%25").await;
    assert!(body.as_array().unwrap().is_empty());
}

// ── Maps ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_maps() {
    let (status, body) = get(app().await, "/api/maps").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        names(&body),
        vec!["Coastline", "Kafe Dostoyevsky", "Kanal", "Oregon", "Villa"]
    );
}

#[tokio::test]
async fn test_map_detail_by_slug() {
    let (status, body) = get(app().await, "/api/maps/kafe-dostoyevsky").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Kafe Dostoyevsky");
    assert_eq!(body["defender_sites_list"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_map_sites() {
    let (status, body) = get(app().await, "/api/map-sites/Oregon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["sites"],
        serde_json::json!(["Kitchen", "Kids Bedroom", "Basement"])
    );
}

#[tokio::test]
async fn test_map_sites_unknown_map() {
    let (status, body) = get(app().await, "/api/map-sites/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["sites"], serde_json::json!([]));
}

// ── Game info ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_game_info_in_insertion_order() {
    let (status, body) = get(app().await, "/api/game-info").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["section_title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 6);
    assert_eq!(titles[0], "About Rainbow Six Siege");
    assert_eq!(titles[5], "About the Developers & Future");
}

#[tokio::test]
async fn test_reseeding_adds_nothing() {
    let db = seeded_db().await;
    let seed = CatalogSeed::from_json(include_str!("../data/catalog.json")).unwrap();
    let report = db.seed(&seed).await.unwrap();
    assert_eq!(report.operators, 0);
    assert_eq!(report.maps, 0);
    assert_eq!(report.info_sections, 0);
    assert_eq!(db.list_info_sections().await.unwrap().len(), 6);
}

// ── Documentation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_llms_txt_served() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/llms.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("/api/lineup-suggestion"));
}
