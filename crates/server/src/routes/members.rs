use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::utils::serde_ext::empty_string_as_none;
use service::member::domain::{CreateMemberInput, Member, MemberId, MemberStatus, UpdateMemberInput};
use service::Pagination;

use super::{json_body, query_params, AppState, PageView};
use crate::errors::ApiError;

/// Outward shape of a member. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberView {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    pub age: u16,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: MemberStatus,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Member> for MemberView {
    fn from(m: Member) -> Self {
        Self {
            has_password: m.has_password(),
            id: m.id,
            name: m.name,
            email: m.email,
            age: m.age,
            phone: m.phone,
            avatar: m.avatar,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemberPageQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page_size: Option<i64>,
    /// Substring of name or email
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteInput {
    pub ids: Vec<MemberId>,
}

/// Trims the address and applies a minimal shape check; deliverability is not our concern.
fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("email is required"));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(email.to_string())
        }
        _ => Err(ApiError::validation("email is malformed")),
    }
}

#[utoipa::path(
    post, path = "/members", tag = "members",
    request_body = crate::openapi::CreateMemberDoc,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 409, description = "Email Exists")
    )
)]
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateMemberInput>, JsonRejection>,
) -> Result<(StatusCode, Json<MemberView>), ApiError> {
    let mut input = json_body(body)?;
    input.email = normalize_email(&input.email)?;
    let member = state.members.create(input).await.map_err(|e| state.reject(e))?;
    info!(member_id = member.id, "member_create_ok");
    Ok((StatusCode::CREATED, Json(member.into())))
}

#[utoipa::path(
    get, path = "/members", tag = "members",
    params(MemberPageQuery),
    responses((status = 200, description = "Page OK"))
)]
pub async fn paginate(
    State(state): State<AppState>,
    query: Result<Query<MemberPageQuery>, QueryRejection>,
) -> Result<Json<PageView<MemberView>>, ApiError> {
    let q = query_params(query)?;
    let pagination = Pagination::new(q.page.unwrap_or(0), q.page_size.unwrap_or(0));
    let keyword = q.keyword.unwrap_or_default();
    let (items, total) = state
        .members
        .paginate(pagination, keyword.trim())
        .await
        .map_err(|e| state.reject(e))?;
    let items = items.into_iter().map(MemberView::from).collect();
    Ok(Json(PageView::new(items, total, pagination.normalize())))
}

#[utoipa::path(
    get, path = "/members/{id}", tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    responses((status = 200, description = "OK"), (status = 404, description = "Not Found"))
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<MemberId>) -> Result<Json<MemberView>, ApiError> {
    let member = state.members.get_by_id(id).await.map_err(|e| state.reject(e))?;
    Ok(Json(member.into()))
}

#[utoipa::path(
    patch, path = "/members/{id}", tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    request_body = crate::openapi::UpdateMemberDoc,
    responses(
        (status = 200, description = "Updated"),
        (status = 400, description = "Validation Error"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Email Exists")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<MemberId>,
    body: Result<Json<UpdateMemberInput>, JsonRejection>,
) -> Result<Json<MemberView>, ApiError> {
    let mut input = json_body(body)?;
    if let Some(email) = input.email.as_mut() {
        *email = normalize_email(email)?;
    }
    let member = state.members.update(id, input).await.map_err(|e| state.reject(e))?;
    Ok(Json(member.into()))
}

#[utoipa::path(
    delete, path = "/members/{id}", tag = "members",
    params(("id" = i64, Path, description = "Member ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<MemberId>) -> Result<StatusCode, ApiError> {
    state.members.delete(id).await.map_err(|e| state.reject(e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/members/batch-delete", tag = "members",
    request_body = crate::openapi::BatchDeleteDoc,
    responses((status = 204, description = "All Deleted"), (status = 404, description = "Stopped At Missing Member"))
)]
pub async fn batch_delete(
    State(state): State<AppState>,
    body: Result<Json<BatchDeleteInput>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let input = json_body(body)?;
    state.members.batch_delete(&input.ids).await.map_err(|e| state.reject(e))?;
    Ok(StatusCode::NO_CONTENT)
}
