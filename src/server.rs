use crate::config::AppConfig;
use crate::data;
use crate::error::CrimeMapError;
use crate::map::{FeatureFill, HoverDetail, RegionLayer};
use crate::names::CanonicalNameMap;
use crate::color::ColorScale;
use crate::sort::{self, Column, RegionColumn, SortModel, SortSpec, YearColumn};
use crate::store::{Snapshot, Store};
use crate::types::{OverallStats, RegionSummary, YearlyRecord};
use crate::viewport::{Viewport, ViewportController};
use anyhow::Result;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub struct AppState {
    pub store: Store,
    pub names: CanonicalNameMap,
    pub scale: ColorScale,
    pub layer: Option<RegionLayer>,
    pub viewport: Mutex<ViewportController>,
    pub data_csv: PathBuf,
}

impl AppState {
    /// Loads records and boundaries named by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let names = config.name_map()?;
        let records = data::load_records(&config.input.data_csv, &names)?;
        let layer = match &config.input.boundaries {
            Some(path) => Some(RegionLayer::new(data::load_boundaries(path, &config.input.name_property)?)),
            None => {
                info!("No boundaries configured; map endpoints are disabled");
                None
            }
        };

        Ok(AppState {
            store: Store::with_records(records),
            names,
            scale: config.color_scale()?,
            layer,
            viewport: Mutex::new(config.viewport_controller()?),
            data_csv: config.input.data_csv.clone(),
        })
    }

    fn viewport(&self) -> MutexGuard<'_, ViewportController> {
        match self.viewport.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// JSON error body: `{error, details}`.
pub enum ApiError {
    Core(CrimeMapError),
    /// The request could not be extracted (bad query, path or body)
    Rejection { status: StatusCode, details: String },
}

impl From<CrimeMapError> for ApiError {
    fn from(err: CrimeMapError) -> Self {
        ApiError::Core(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejection {
            status: rejection.status(),
            details: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejection {
            status: rejection.status(),
            details: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejection {
            status: rejection.status(),
            details: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Core(err) => {
                let (status, error) = match &err {
                    CrimeMapError::DataUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Data unavailable"),
                    CrimeMapError::RegionNotFound(_) => (StatusCode::NOT_FOUND, "Region not found"),
                    CrimeMapError::UnknownColumn(_) | CrimeMapError::UnknownDirection(_) => {
                        (StatusCode::BAD_REQUEST, "Invalid sort")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
                };
                (status, error, err.to_string())
            }
            ApiError::Rejection { status, details } => (status, "Invalid request", details),
        };
        warn!("Request failed ({}): {}", status, details);
        (status, Json(ErrorBody { error, details })).into_response()
    }
}

// Extractors whose rejections render as `ApiError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
struct Query<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
struct Path<T>(T);

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
struct JsonBody<T>(T);

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct SortParams {
    sort: Option<String>,
    dir: Option<String>,
    toggle: Option<String>,
}

#[derive(Deserialize)]
pub struct HoverParams {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    /// [longitude, latitude]
    center: [f64; 2],
}

#[derive(Serialize)]
pub struct ResolveResponse {
    name: String,
    canonical: String,
}

#[derive(Serialize)]
pub struct TableResponse {
    sort: SortSpec<YearColumn>,
    rows: Vec<YearlyRecord>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    installed: bool,
    records: usize,
}

pub fn router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/crimes", get(list_crimes))
        .route("/api/crimes/stats/overall", get(overall_stats))
        .route("/api/crimes/{state}", get(region_crimes))
        .route("/api/table/{state}", get(region_table))
        .route("/api/resolve/{name}", get(resolve_name))
        .route("/api/map/features", get(map_features))
        .route("/api/map/hover", get(map_hover))
        .route("/api/viewport", get(get_viewport))
        .route("/api/viewport/zoom-in", post(zoom_in))
        .route("/api/viewport/zoom-out", post(zoom_out))
        .route("/api/viewport/move", post(move_viewport))
        .route("/api/reload", post(reload));

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(CorsLayer::permissive()).with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    info!("Loading data for API...");
    let state = Arc::new(AppState::from_config(&config)?);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = router(state, config.server.static_dir.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Canonical spelling of a region as the store keys it.
///
/// Resolves display-name variants, then matches case-insensitively against
/// loaded summaries; unknown names pass through unchanged.
fn store_region(snapshot: &Snapshot, names: &CanonicalNameMap, raw: &str) -> String {
    let canonical = names.resolve(raw);
    snapshot
        .summary(canonical)
        .map(|s| s.region.clone())
        .unwrap_or_else(|| canonical.to_string())
}

async fn list_crimes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SortParams>,
) -> ApiResult<Vec<RegionSummary>> {
    let snapshot = state.store.snapshot();
    if params.sort.is_none() && params.dir.is_none() {
        return Ok(Json(snapshot.summaries().to_vec()));
    }
    let spec = SortSpec::<RegionColumn>::parse(params.sort.as_deref(), params.dir.as_deref())?;
    Ok(Json(sort::apply(snapshot.summaries(), spec)))
}

async fn region_crimes(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
    Query(params): Query<SortParams>,
) -> ApiResult<Vec<YearlyRecord>> {
    let snapshot = state.store.snapshot();
    let years = snapshot.region_years(&store_region(&snapshot, &state.names, &region))?;
    if params.sort.is_none() && params.dir.is_none() {
        return Ok(Json(years));
    }
    let spec = SortSpec::<YearColumn>::parse(params.sort.as_deref(), params.dir.as_deref())?;
    Ok(Json(sort::apply(&years, spec)))
}

async fn region_table(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
    Query(params): Query<SortParams>,
) -> ApiResult<TableResponse> {
    let snapshot = state.store.snapshot();
    let years = snapshot.region_years(&store_region(&snapshot, &state.names, &region))?;

    let mut model = SortModel::new(SortSpec::<YearColumn>::parse(
        params.sort.as_deref(),
        params.dir.as_deref(),
    )?);
    if let Some(key) = params.toggle.as_deref() {
        model.toggle(YearColumn::parse(key)?);
    }

    Ok(Json(TableResponse {
        sort: model.spec(),
        rows: model.apply(&years),
    }))
}

async fn overall_stats(State(state): State<Arc<AppState>>) -> ApiResult<OverallStats> {
    Ok(Json(state.store.snapshot().overall()?))
}

async fn resolve_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<ResolveResponse> {
    let canonical = state.names.resolve(&name).to_string();
    Json(ResolveResponse { name, canonical })
}

fn region_layer(state: &AppState) -> Result<&RegionLayer, ApiError> {
    state.layer.as_ref().ok_or_else(|| {
        CrimeMapError::DataUnavailable("no region boundaries configured".to_string()).into()
    })
}

async fn map_features(State(state): State<Arc<AppState>>) -> ApiResult<Vec<FeatureFill>> {
    let layer = region_layer(&state)?;
    let snapshot = state.store.snapshot();
    Ok(Json(layer.fills(&snapshot, &state.names, &state.scale)))
}

async fn map_hover(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HoverParams>,
) -> ApiResult<Option<HoverDetail>> {
    let layer = region_layer(&state)?;
    let snapshot = state.store.snapshot();
    Ok(Json(layer.hover(&snapshot, &state.names, params.lon, params.lat)))
}

async fn get_viewport(State(state): State<Arc<AppState>>) -> Json<Viewport> {
    Json(state.viewport().viewport())
}

async fn zoom_in(State(state): State<Arc<AppState>>) -> Json<Viewport> {
    Json(state.viewport().zoom_in())
}

async fn zoom_out(State(state): State<Arc<AppState>>) -> Json<Viewport> {
    Json(state.viewport().zoom_out())
}

async fn move_viewport(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<MoveRequest>,
) -> Json<Viewport> {
    let [lon, lat] = request.center;
    Json(state.viewport().on_external_move((lon, lat)))
}

/// Re-reads the statistics CSV. If another reload was issued while this one
/// was reading, this result is dropped.
async fn reload(State(state): State<Arc<AppState>>) -> ApiResult<ReloadResponse> {
    let token = state.store.begin_load();
    info!("Reload {:?} started", token);

    let loader = state.clone();
    let records = tokio::task::spawn_blocking(move || data::load_records(&loader.data_csv, &loader.names))
        .await
        .map_err(|e| CrimeMapError::DataUnavailable(format!("reload task failed: {e}")))?
        .map_err(|e| CrimeMapError::DataUnavailable(format!("{e:#}")))?;

    let count = records.len();
    let installed = state.store.complete_load(token, records);
    Ok(Json(ReloadResponse {
        installed,
        records: count,
    }))
}
