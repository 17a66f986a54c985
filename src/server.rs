//! REST surface for the monument catalog, visit log and chatbot.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State as AxumState},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::db::catalog::{india_map_geojson, MonumentCatalog};
use crate::db::models::{Monument, MonumentVisit, Period, VisitedMonument};
use crate::db::repos::visits as visit_repo;
use crate::db::DbPool;
use crate::engine::assets::{load_model, AssetLoad, AssetSource};
use crate::engine::intent::{IntentMatcher, MatchResult};
use crate::engine::period::{period_context, period_info, timeline, PeriodInfo, TimelineEvent};
use crate::error::{ApiError, AppError};
use crate::store::{VisitCounter, WelcomeGate};
use crate::validation::require_non_empty;

/// Shared state for the HTTP server.
pub struct AppState {
    pub catalog: Arc<MonumentCatalog>,
    pub pool: DbPool,
    pub assets: Arc<dyn AssetSource>,
    pub fallback_model: String,
    pub matcher: Arc<IntentMatcher>,
    pub visits: Arc<VisitCounter>,
    pub welcome: Arc<WelcomeGate>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/monuments", get(list_monuments))
        .route("/api/monuments/{id}", get(get_monument))
        .route("/api/monuments/{id}/visit", post(record_visit))
        .route("/api/monuments/{id}/visits", get(visit_count))
        .route("/api/monuments/{id}/models", get(monument_models))
        .route("/api/monuments/{id}/timeline", get(monument_timeline))
        .route("/api/client/visits", get(client_visits).delete(clear_client_visits))
        .route("/api/client/visits/{id}", get(client_visit).post(count_client_visit))
        .route("/api/client/welcome", get(welcome_status).post(dismiss_welcome))
        .route("/api/map/india", get(india_map))
        .route("/api/periods", get(list_periods))
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind `addr` and serve until `shutdown_rx` changes.
pub async fn start_server(
    state: AppState,
    addr: SocketAddr,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state, shutdown_rx).await
}

/// Serve on an already bound listener.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let addr = listener.local_addr()?;
    tracing::info!("Historica server listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("Historica server shutting down");
        })
        .await?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "historica" }))
}

/// GET /api/monuments
async fn list_monuments(AxumState(state): AxumState<Arc<AppState>>) -> Json<Vec<Monument>> {
    Json(state.catalog.all().to_vec())
}

/// GET /api/monuments/{id}
async fn get_monument(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Monument>, ApiError> {
    state
        .catalog
        .require(&id)
        .cloned()
        .map(Json)
        .map_err(|e| ApiError::from_app(e, "Error fetching monument details"))
}

/// POST /api/monuments/{id}/visit
async fn record_visit(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonumentVisit>, ApiError> {
    const CONTEXT: &str = "Error recording monument visit";
    state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, CONTEXT))?;

    let pool = state.pool.clone();
    let visit = blocking(CONTEXT, move || visit_repo::record(&pool, &id)).await?;
    Ok(Json(visit))
}

/// Run a SQLite-bound closure off the async executor.
async fn blocking<T, F>(context: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::from_app(AppError::Internal(e.to_string()), context))?
        .map_err(|e| ApiError::from_app(e, context))
}

const RECENT_VISITS: i64 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitCount {
    monument_id: String,
    visit_count: i64,
    recent_visits: Vec<MonumentVisit>,
}

/// GET /api/monuments/{id}/visits
async fn visit_count(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<VisitCount>, ApiError> {
    const CONTEXT: &str = "Error fetching visit count";
    state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, CONTEXT))?;
    let pool = state.pool.clone();
    let counts = blocking(CONTEXT, move || {
        let visit_count = visit_repo::count_for_monument(&pool, &id)?;
        let recent_visits = visit_repo::get_recent(&pool, &id, Some(RECENT_VISITS))?;
        Ok(VisitCount {
            monument_id: id,
            visit_count,
            recent_visits,
        })
    })
    .await?;
    Ok(Json(counts))
}

#[derive(Debug, Serialize)]
struct PeriodModel {
    period: Period,
    #[serde(flatten)]
    load: AssetLoad,
}

/// GET /api/monuments/{id}/models: every period model, resolved through the loader.
async fn monument_models(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<PeriodModel>>, ApiError> {
    let monument = state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, "Error fetching monument models"))?;

    let mut models = Vec::with_capacity(Period::ALL.len());
    for period in Period::ALL {
        let load = load_model(
            state.assets.as_ref(),
            monument.model_for(period),
            &state.fallback_model,
        )
        .await;
        models.push(PeriodModel { period, load });
    }
    Ok(Json(models))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodContext {
    period: Period,
    context: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonumentTimeline {
    monument_id: String,
    contexts: Vec<PeriodContext>,
    events: Vec<TimelineEvent>,
}

/// GET /api/monuments/{id}/timeline
async fn monument_timeline(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MonumentTimeline>, ApiError> {
    let monument = state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, "Error fetching monument timeline"))?;
    let contexts = Period::ALL
        .into_iter()
        .map(|period| PeriodContext {
            period,
            context: period_context(monument, period),
        })
        .collect();
    Ok(Json(MonumentTimeline {
        monument_id: monument.id.clone(),
        contexts,
        events: timeline(monument),
    }))
}

/// GET /api/client/visits
async fn client_visits(AxumState(state): AxumState<Arc<AppState>>) -> Json<Vec<VisitedMonument>> {
    Json(state.visits.snapshot())
}

/// DELETE /api/client/visits
async fn clear_client_visits(
    AxumState(state): AxumState<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let visits = state.visits.clone();
    blocking("Error clearing visit history", move || visits.clear_history()).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientVisit {
    id: String,
    visit_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_visited: Option<String>,
}

impl ClientVisit {
    fn from_counter(counter: &VisitCounter, id: String) -> Self {
        match counter.record(&id) {
            Some(record) => Self {
                id,
                visit_count: record.visit_count,
                last_visited: Some(record.last_visited),
            },
            None => Self {
                id,
                visit_count: 0,
                last_visited: None,
            },
        }
    }
}

/// GET /api/client/visits/{id}: zero for a monument never opened.
async fn client_visit(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientVisit>, ApiError> {
    state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, "Error fetching visit history"))?;
    Ok(Json(ClientVisit::from_counter(&state.visits, id)))
}

/// POST /api/client/visits/{id}
async fn count_client_visit(
    AxumState(state): AxumState<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientVisit>, ApiError> {
    const CONTEXT: &str = "Error counting monument visit";
    state
        .catalog
        .require(&id)
        .map_err(|e| ApiError::from_app(e, CONTEXT))?;

    let visits = state.visits.clone();
    let visit = blocking(CONTEXT, move || {
        visits.increment(&id)?;
        Ok(ClientVisit::from_counter(&visits, id))
    })
    .await?;
    Ok(Json(visit))
}

#[derive(Debug, Serialize)]
struct WelcomeStatus {
    show: bool,
}

/// GET /api/client/welcome
async fn welcome_status(
    AxumState(state): AxumState<Arc<AppState>>,
) -> Result<Json<WelcomeStatus>, ApiError> {
    let welcome = state.welcome.clone();
    let show = blocking("Error reading welcome state", move || welcome.should_show()).await?;
    Ok(Json(WelcomeStatus { show }))
}

/// POST /api/client/welcome: the visitor has seen the overlay.
async fn dismiss_welcome(
    AxumState(state): AxumState<Arc<AppState>>,
) -> Result<Json<WelcomeStatus>, ApiError> {
    let welcome = state.welcome.clone();
    blocking("Error dismissing welcome", move || welcome.dismiss()).await?;
    Ok(Json(WelcomeStatus { show: false }))
}

/// GET /api/map/india
async fn india_map() -> Json<serde_json::Value> {
    Json(india_map_geojson())
}

/// GET /api/periods
async fn list_periods() -> Json<Vec<PeriodInfo>> {
    Json(Period::ALL.into_iter().map(period_info).collect())
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
}

/// POST /api/chat: stateless, replies without the session delay.
async fn chat(
    AxumState(state): AxumState<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<MatchResult>, ApiError> {
    require_non_empty("message", &req.message)
        .map_err(|e| ApiError::from_app(e, "Error answering chat message"))?;
    let result = state.matcher.respond(&req.message, &mut rand::thread_rng());
    Ok(Json(result))
}
