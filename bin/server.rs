// Transfer Hub - API Server
// Read-only JSON over the aggregated transfer view

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tower_http::cors::CorsLayer;
use transfer_hub::logging::{init_logging, LogConfig};
use transfer_hub::{
    filter_by_window, CategorizedTransfers, ClubRegistry, DataStatus, FeedAdapter, HubConfig,
    MergeDecision, StaleRumor, StaleRumorChecker, Transfer, TransferCounts, TransferDataStore,
    WindowFilter,
};

/// How often the scheduler checks for due feeds
const SCHEDULER_TICK: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<TransferDataStore>>,
    clubs: Arc<ClubRegistry>,
    rumor_stale_days: i64,
}

impl AppState {
    fn lock(&self) -> Result<MutexGuard<'_, TransferDataStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::internal("transfer store lock poisoned"))
    }

    /// Route segment (slug or club name) to the name the categorizer matches on
    fn club_name(&self, raw: &str) -> String {
        self.clubs.resolve_route(&decode_club(raw))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: &str) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }

    fn bad_request(message: String) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, error = %self.message, "Request failed");
        let body = ApiResponse {
            success: false,
            data: (),
            error: Some(self.message),
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransfersResponse {
    transfers: Vec<Transfer>,
    decision: MergeDecision,
    status: DataStatus,
    fallback_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedStatus {
    name: String,
    count: usize,
    last_updated: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    status: DataStatus,
    label: &'static str,
    feeds: Vec<FeedStatus>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClubResponse {
    club: String,
    counts: TransferCounts,
    transfers: CategorizedTransfers,
}

#[derive(Deserialize)]
struct WindowQuery {
    window: Option<String>,
}

#[derive(Deserialize)]
struct StaleQuery {
    days: Option<i64>,
}

fn parse_window(raw: Option<&str>) -> Result<WindowFilter, ApiError> {
    match raw {
        None => Ok(WindowFilter::All),
        Some(raw) => WindowFilter::parse(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown window: {}", raw))),
    }
}

fn decode_club(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/transfers?window=summer - Merged, deduplicated transfers
async fn get_transfers(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<TransfersResponse> {
    let filter = parse_window(query.window.as_deref())?;
    let merged = state.lock()?.all_transfers(Utc::now());

    Ok(Json(ApiResponse::ok(TransfersResponse {
        transfers: filter_by_window(&merged.transfers, filter),
        decision: merged.decision,
        status: merged.status,
        fallback_count: merged.fallback_count,
    })))
}

/// GET /api/status - Freshness badge plus per-feed state
async fn get_status(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let store = state.lock()?;
    let now = Utc::now();
    let status = store.data_status(now);

    let feeds = store
        .feed_names()
        .into_iter()
        .filter_map(|name| {
            let snapshot = store.snapshot(&name)?;
            Some(FeedStatus {
                count: snapshot.transfers.len(),
                last_updated: snapshot.last_updated.map(|at| at.to_rfc3339()),
                error: snapshot.error.clone(),
                name,
            })
        })
        .collect();

    Ok(Json(ApiResponse::ok(StatusResponse {
        status,
        label: status.label(),
        feeds,
    })))
}

/// GET /api/clubs/:club?window=winter - Categorized view for one club (name or slug)
async fn get_club(
    State(state): State<AppState>,
    Path(club): Path<String>,
    Query(query): Query<WindowQuery>,
) -> ApiResult<ClubResponse> {
    let club = state.club_name(&club);
    let filter = parse_window(query.window.as_deref())?;
    let view = state.lock()?.club_view(&club, Utc::now());

    let transfers = CategorizedTransfers {
        confirmed_in: filter_by_window(&view.confirmed_in, filter),
        confirmed_out: filter_by_window(&view.confirmed_out, filter),
        rumors: filter_by_window(&view.rumors, filter),
    };

    Ok(Json(ApiResponse::ok(ClubResponse {
        counts: transfers.counts(),
        transfers,
        club,
    })))
}

/// GET /api/clubs/:club/counts - Bucket sizes only
async fn get_club_counts(
    State(state): State<AppState>,
    Path(club): Path<String>,
) -> ApiResult<TransferCounts> {
    let club = state.club_name(&club);
    let view = state.lock()?.club_view(&club, Utc::now());
    Ok(Json(ApiResponse::ok(view.counts())))
}

/// GET /api/stale?days=3 - Gossip past the staleness threshold
async fn get_stale(
    State(state): State<AppState>,
    Query(query): Query<StaleQuery>,
) -> ApiResult<Vec<StaleRumor>> {
    let now = Utc::now();
    let merged = state.lock()?.all_transfers(now);
    let checker =
        StaleRumorChecker::new(now).with_threshold(query.days.unwrap_or(state.rumor_stale_days));
    Ok(Json(ApiResponse::ok(checker.check(&merged.transfers))))
}

/// POST /api/refresh - Refresh every feed now
async fn refresh(State(state): State<AppState>) -> ApiResult<StatusResponse> {
    let started = state.lock()?.begin_refresh_all(Utc::now());
    fetch_feeds(&state, started).await?;
    get_status(State(state)).await
}

// ============================================================================
// Feed fetching
// ============================================================================

/// Fetch started feeds on the blocking pool; the store lock is only taken to
/// record each result
async fn fetch_feeds(
    state: &AppState,
    started: Vec<(String, Arc<dyn FeedAdapter>)>,
) -> Result<(), ApiError> {
    for (name, adapter) in started {
        let result = tokio::task::spawn_blocking(move || adapter.get_transfers())
            .await
            .unwrap_or_else(|e| Err(anyhow::anyhow!("feed task failed: {}", e)));
        state.lock()?.complete_refresh(&name, result, Utc::now());
    }
    Ok(())
}

// ============================================================================
// Scheduler
// ============================================================================

fn spawn_scheduler(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SCHEDULER_TICK);
        loop {
            interval.tick().await;
            let started = match state.store.lock() {
                Ok(mut store) => store.begin_due_refreshes(Utc::now()),
                Err(_) => {
                    tracing::error!("Transfer store lock poisoned, stopping scheduler");
                    return;
                }
            };
            if fetch_feeds(&state, started).await.is_err() {
                tracing::error!("Transfer store lock poisoned, stopping scheduler");
                return;
            }
        }
    });
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LogConfig::default())?;

    let config = match std::env::args().nth(1) {
        Some(path) => HubConfig::from_file(&path)?,
        None => HubConfig::default(),
    };

    let store = TransferDataStore::from_config(&config)?;
    tracing::info!(
        fixtures = store.fixtures().len(),
        feeds = ?store.feed_names(),
        "Transfer store ready"
    );

    let state = AppState {
        store: Arc::new(Mutex::new(store)),
        clubs: Arc::new(ClubRegistry::with_defaults()),
        rumor_stale_days: config.rumor_stale_days,
    };
    spawn_scheduler(state.clone());

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/transfers", get(get_transfers))
        .route("/status", get(get_status))
        .route("/clubs/:club", get(get_club))
        .route("/clubs/:club/counts", get(get_club_counts))
        .route("/stale", get(get_stale))
        .route("/refresh", post(refresh))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_addr))?;

    tracing::info!(
        addr = %config.server_addr,
        version = transfer_hub::VERSION,
        "Server running"
    );

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
