use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct CreateMemberDoc {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub age: Option<u16>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// `active` or `disabled`
    pub status: Option<String>,
}

/// Merge patch: absent or `null` leaves a field unchanged; `""` phone or avatar clears it.
#[derive(ToSchema)]
pub struct UpdateMemberDoc {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<u16>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: Option<String>,
}

#[derive(ToSchema)]
pub struct BatchDeleteDoc { pub ids: Vec<i64> }

#[derive(ToSchema)]
pub struct LoginEventDoc {
    pub user_id: i64,
    pub username: String,
    pub ip: String,
    pub user_agent: String,
    pub device_id: String,
    pub city: String,
    pub country: String,
}

#[derive(ToSchema)]
pub struct ErrorBodyDoc { pub code: u32, pub key: String, pub message: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::members::create,
        crate::routes::members::paginate,
        crate::routes::members::get,
        crate::routes::members::update,
        crate::routes::members::delete,
        crate::routes::members::batch_delete,
        crate::routes::login_logs::record,
        crate::routes::login_logs::list,
        crate::routes::login_logs::by_member,
    ),
    components(
        schemas(
            HealthResponse,
            CreateMemberDoc,
            UpdateMemberDoc,
            BatchDeleteDoc,
            LoginEventDoc,
            ErrorBodyDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "members"),
        (name = "login-logs")
    )
)]
pub struct ApiDoc;
