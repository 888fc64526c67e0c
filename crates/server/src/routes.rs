use std::sync::Arc;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::Query,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;

use common::types::Health;
use service::login_log::repository::LoginLogRepository;
use service::member::repository::MemberRepository;
use service::{ErrorCatalog, LoginLogService, MemberError, MemberService};

use common::utils::serde_ext::empty_string_as_none;
use service::PageRequest;

use crate::errors::ApiError;
use crate::openapi::ApiDoc;

pub mod login_logs;
pub mod members;

/// Shared handler state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub members: Arc<MemberService<dyn MemberRepository>>,
    pub login_logs: Arc<LoginLogService<dyn LoginLogRepository>>,
    pub catalog: Arc<ErrorCatalog>,
}

impl AppState {
    pub fn new(members: MemberService<dyn MemberRepository>, login_logs: LoginLogService<dyn LoginLogRepository>) -> Self {
        Self { members: Arc::new(members), login_logs: Arc::new(login_logs), catalog: Arc::new(ErrorCatalog::member()) }
    }

    /// Classify a service failure for the client.
    pub fn reject(&self, err: MemberError) -> ApiError {
        ApiError::from_member(&self.catalog, err)
    }
}

/// One page of results plus the size of the filtered set.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageView<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> PageView<T> {
    pub fn new(items: Vec<T>, total: u64, page: PageRequest) -> Self {
        Self { items, total, page: page.page, page_size: page.per_page }
    }
}

/// `?page=&page_size=`; empty or missing values fall back to defaults.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<i64>,
}

/// Turn extractor rejections into the JSON error body.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(v)| v).map_err(|e| ApiError::validation(e.body_text()))
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(v)| v).map_err(|e| ApiError::validation(e.body_text()))
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let members = Router::new()
        .route("/members", get(members::paginate).post(members::create))
        .route("/members/batch-delete", post(members::batch_delete))
        .route("/members/:id", get(members::get).patch(members::update).delete(members::delete))
        .route("/members/:id/login-logs", get(login_logs::by_member));

    let login_logs = Router::new()
        .route("/login-logs", get(login_logs::list).post(login_logs::record));

    Router::new()
        .route("/health", get(health))
        .route("/openapi.json", get(openapi_json))
        .merge(members)
        .merge(login_logs)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
