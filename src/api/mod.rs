// HTTP API routes (catalog queries, search, lineup suggestions).

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRef, Json, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::Instrument;
use uuid::Uuid;

use crate::db::{Database, InfoSection, Operator, Side};
use crate::error::AppError;
use crate::lineup::{self, LineupForm};
use crate::llm::SuggestionClient;
use crate::metrics;
use crate::rate_limit::{ClientKey, RateLimiter};
use crate::views::{MapView, OperatorView};

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListOperatorsParams {
    pub side: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

// ── Response types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LineupResponse {
    pub operators: Vec<OperatorView>,
    pub error: Option<String>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    /// `None` when no API credential is configured; the suggestor is then unavailable.
    pub suggestions: Option<SuggestionClient>,
    pub rate_limiter: RateLimiter,
    pub suggestion_count: usize,
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}

fn views(operators: Vec<Operator>) -> Vec<OperatorView> {
    operators.into_iter().map(OperatorView::from).collect()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Operators
        .route("/api/operators", get(list_operators))
        .route("/api/operators/{slug}", get(get_operator))
        .route("/api/search", get(search_operators))
        // Maps
        .route("/api/maps", get(list_maps))
        .route("/api/maps/{slug}", get(get_map))
        .route("/api/map-sites/{name}", get(get_map_sites))
        // Static information
        .route("/api/game-info", get(list_game_info))
        // Lineup suggestor
        .route("/api/lineup-suggestion", post(suggest_lineup))
        // Operations and documentation
        .route("/metrics", get(get_metrics))
        .route("/llms.txt", get(get_llms_txt))
        .route_layer(middleware::from_fn(metrics::track_requests))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "siege-guide",
        "llm_enabled": state.suggestions.is_some(),
    }))
}

// ── Operator handlers ─────────────────────────────────────────────────

async fn list_operators(
    State(state): State<AppState>,
    Query(params): Query<ListOperatorsParams>,
) -> Result<Json<Value>, AppError> {
    if let Some(side) = params.side.as_deref().filter(|s| !s.trim().is_empty()) {
        let side = side.parse::<Side>().map_err(AppError::Validation)?;
        let ops = state.db.find_operators_by_side(side).await?;
        return Ok(Json(json!(views(ops))));
    }

    let (attackers, defenders): (Vec<_>, Vec<_>) = state
        .db
        .list_operators()
        .await?
        .into_iter()
        .partition(|op| op.side == Side::Attacker);
    Ok(Json(json!({
        "attackers": views(attackers),
        "defenders": views(defenders),
    })))
}

async fn get_operator(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<OperatorView>, AppError> {
    match state.db.find_operator_by_slug(&slug).await? {
        Some(op) => Ok(Json(OperatorView::from(op))),
        None => Err(AppError::NotFound(format!("Operator '{slug}'"))),
    }
}

async fn search_operators(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<OperatorView>>, AppError> {
    let query = params.query.unwrap_or_default();
    let ops = state.db.search_operators(&query).await?;
    Ok(Json(views(ops)))
}

// ── Map handlers ──────────────────────────────────────────────────────

async fn list_maps(State(state): State<AppState>) -> Result<Json<Vec<MapView>>, AppError> {
    let maps = state.db.list_maps().await?;
    Ok(Json(maps.into_iter().map(MapView::from).collect()))
}

async fn get_map(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<MapView>, AppError> {
    match state.db.find_map_by_slug(&slug).await? {
        Some(map) => Ok(Json(MapView::from(map))),
        None => Err(AppError::NotFound(format!("Map '{slug}'"))),
    }
}

/// Unknown maps answer 404 with an empty site list so site pickers can render.
async fn get_map_sites(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let response = match state.db.find_map_by_name(&name).await? {
        Some(map) => {
            let view = MapView::from(map);
            (StatusCode::OK, Json(json!({ "sites": view.defender_sites_list })))
        }
        None => (StatusCode::NOT_FOUND, Json(json!({ "sites": [] }))),
    };
    Ok(response)
}

// ── Info handlers ─────────────────────────────────────────────────────

async fn list_game_info(
    State(state): State<AppState>,
) -> Result<Json<Vec<InfoSection>>, AppError> {
    Ok(Json(state.db.list_info_sections().await?))
}

// ── Lineup suggestor ──────────────────────────────────────────────────

async fn suggest_lineup(
    State(state): State<AppState>,
    client: ClientKey,
    payload: Result<Json<LineupForm>, JsonRejection>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("lineup", %request_id, client = %client.0);

    let result = match payload {
        Ok(Json(form)) => run_lineup(&state, &client, form).instrument(span).await,
        Err(rejection) => Err(AppError::Validation(format!(
            "Invalid lineup request: {}",
            rejection.body_text()
        ))),
    };

    match result {
        Ok(ops) if ops.is_empty() => {
            metrics::LINEUP_REQUESTS_TOTAL
                .with_label_values(&["no_suggestions"])
                .inc();
            metrics::SUGGESTIONS_RETURNED.observe(0.0);
            (
                StatusCode::OK,
                Json(LineupResponse {
                    operators: Vec::new(),
                    error: Some(
                        "The AI could not suggest valid operators from our catalog. Please try a different situation."
                            .to_string(),
                    ),
                }),
            )
        }
        Ok(ops) => {
            metrics::LINEUP_REQUESTS_TOTAL
                .with_label_values(&["suggested"])
                .inc();
            metrics::SUGGESTIONS_RETURNED.observe(ops.len() as f64);
            (
                StatusCode::OK,
                Json(LineupResponse {
                    operators: views(ops),
                    error: None,
                }),
            )
        }
        Err(e) => {
            let label = match &e {
                AppError::Validation(_) => "validation",
                AppError::NotFound(_) => "not_found",
                AppError::Configuration(_) => "unavailable",
                AppError::ExternalService(_) => "external_error",
                AppError::RateLimited(_) => "rate_limited",
                AppError::Database(_) => "internal",
            };
            metrics::LINEUP_REQUESTS_TOTAL
                .with_label_values(&[label])
                .inc();
            e.log();
            (
                e.status(),
                Json(LineupResponse {
                    operators: Vec::new(),
                    error: Some(e.user_message()),
                }),
            )
        }
    }
}

async fn run_lineup(
    state: &AppState,
    client: &ClientKey,
    form: LineupForm,
) -> Result<Vec<Operator>, AppError> {
    let suggestions = state.suggestions.as_ref().ok_or_else(|| {
        AppError::Configuration("lineup suggestor requested without LLM_API_KEY".to_string())
    })?;

    let request = form.validate()?;
    tracing::info!(
        map = %request.map_name,
        site = %request.site,
        side = %request.side,
        solo_queue = request.solo_queue,
        "Lineup suggestion requested"
    );

    state
        .rate_limiter
        .check_limit(&client.0)
        .map_err(|e| AppError::RateLimited(e.to_string()))?;

    let map = state
        .db
        .find_map_by_name(&request.map_name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Map '{}'", request.map_name)))?;

    let roster = state.db.find_operators_by_side(request.side).await?;
    if roster.is_empty() {
        return Err(AppError::NotFound(format!("{} operators", request.side)));
    }

    let prompt = lineup::build_prompt(&request, &map, &roster, state.suggestion_count);
    let raw = suggestions.complete(&prompt).await?;

    let operators =
        lineup::reconcile(&state.db, &raw, request.side, state.suggestion_count).await?;
    tracing::info!("Resolved {} suggested operators", operators.len());
    Ok(operators)
}

// ── Operations and documentation handlers ─────────────────────────────

async fn get_metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics::gather_metrics(),
    )
        .into_response()
}

async fn get_llms_txt() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::llms_txt::LLMS_TXT,
    )
        .into_response()
}
