use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use common::utils::serde_ext::empty_string_as_none;
use service::login_log::domain::{ListPageInput, LoginEvent, LoginLog};
use service::member::domain::MemberId;
use service::Pagination;

use super::{json_body, query_params, AppState, PageQuery, PageView};
use crate::errors::ApiError;

/// `YYYY-MM-DD` dates, inclusive, UTC. Empty values mean unbounded.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginLogListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub user_id: Option<MemberId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<NaiveDate>,
}

#[utoipa::path(
    post, path = "/login-logs", tag = "login-logs",
    request_body = crate::openapi::LoginEventDoc,
    responses((status = 201, description = "Recorded"), (status = 400, description = "Validation Error"))
)]
pub async fn record(
    State(state): State<AppState>,
    body: Result<Json<LoginEvent>, JsonRejection>,
) -> Result<(StatusCode, Json<LoginLog>), ApiError> {
    let event = json_body(body)?;
    let log = state.login_logs.record_login(event).await.map_err(|e| state.reject(e))?;
    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    get, path = "/login-logs", tag = "login-logs",
    params(LoginLogListQuery),
    responses((status = 200, description = "Page OK"), (status = 400, description = "Malformed Filter"))
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<LoginLogListQuery>, QueryRejection>,
) -> Result<Json<PageView<LoginLog>>, ApiError> {
    let q = query_params(query)?;
    debug!(?q, "login_log_list_request");
    let input = ListPageInput {
        page: q.page.unwrap_or(0),
        page_size: q.page_size.unwrap_or(0),
        user_id: q.user_id,
        start_date: q.start_date,
        end_date: q.end_date,
    };
    let page = Pagination::new(input.page, input.page_size).normalize();
    let (items, total) = state.login_logs.list_page(input).await.map_err(|e| state.reject(e))?;
    Ok(Json(PageView::new(items, total, page)))
}

#[utoipa::path(
    get, path = "/members/{id}/login-logs", tag = "login-logs",
    params(("id" = i64, Path, description = "Member ID"), PageQuery),
    responses((status = 200, description = "Page OK"))
)]
pub async fn by_member(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PageView<LoginLog>>, ApiError> {
    let q = query_params(query)?;
    let pagination = Pagination::new(q.page.unwrap_or(0), q.page_size.unwrap_or(0));
    let (items, total) = state
        .login_logs
        .get_by_user_id(id, pagination.page, pagination.per_page)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(PageView::new(items, total, pagination.normalize())))
}
