use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AccessToken,
    entities::{erp_user_role, retailer},
    errors::ServiceError,
    services::{
        demos::{DemoWithUsers, UserWithRoles},
        seeding::{ResetReport, SeedReport},
    },
    AppState,
};

/// Numeric id given either as a JSON number or as a string of digits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IdInput {
    Number(i64),
    Text(String),
}

impl IdInput {
    fn parse(&self, field: &str) -> Result<i32, ServiceError> {
        let invalid = || ServiceError::ValidationError(format!("{} must be an integer id", field));
        match self {
            IdInput::Number(n) => i32::try_from(*n).map_err(|_| invalid()),
            IdInput::Text(s) => s.trim().parse::<i32>().map_err(|_| invalid()),
        }
    }
}

/// Query wins over body; absent from both is a validation error.
fn resolve_id(
    field: &str,
    query: Option<IdInput>,
    body: Option<IdInput>,
) -> Result<i32, ServiceError> {
    query
        .or(body)
        .ok_or_else(|| ServiceError::ValidationError(format!("{} is required", field)))?
        .parse(field)
}

/// Required JSON body; rejections become validation errors.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ServiceError::ValidationError(rejection.body_text()))
}

/// Optional JSON body: a request without a JSON content type carries none.
fn optional_json_body<T>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<Option<T>, ServiceError> {
    match body {
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(None),
        other => json_body(other).map(Some),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDemoRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginAsRequest {
    pub user_id: Option<IdInput>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub retailer_id: Option<IdInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleView {
    pub id: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<erp_user_role::Model> for RoleView {
    fn from(model: erp_user_role::Model) -> Self {
        Self {
            id: model.id,
            role: model.role,
            created_at: model.created_at,
        }
    }
}

/// ERP user as returned to clients; the password hash never leaves the service
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub demo_id: i32,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<RoleView>,
}

impl From<UserWithRoles> for UserView {
    fn from(value: UserWithRoles) -> Self {
        let UserWithRoles { user, roles } = value;
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            demo_id: user.demo_id,
            created_at: user.created_at,
            roles: roles.into_iter().map(RoleView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DemoView {
    pub id: i32,
    pub name: String,
    pub guid: Option<String>,
    pub created_at: DateTime<Utc>,
    pub users: Vec<UserView>,
}

impl From<DemoWithUsers> for DemoView {
    fn from(value: DemoWithUsers) -> Self {
        let DemoWithUsers { demo, users } = value;
        Self {
            id: demo.id,
            name: demo.name,
            guid: demo.guid,
            created_at: demo.created_at,
            users: users.into_iter().map(UserView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetailerView {
    pub id: i32,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub demo_id: Option<i32>,
    pub manager_id: Option<i32>,
}

impl From<retailer::Model> for RetailerView {
    fn from(model: retailer::Model) -> Self {
        Self {
            id: model.id,
            street: model.street,
            city: model.city,
            state: model.state,
            country: model.country,
            latitude: model.latitude,
            longitude: model.longitude,
            demo_id: model.demo_id,
            manager_id: model.manager_id,
        }
    }
}

/// Load reference data into empty tables
#[utoipa::path(
    post,
    path = "/api/Demos/seed",
    responses(
        (status = 200, description = "Per-table seed outcome", body = SeedReport),
        (status = 500, description = "Seed data missing or unreadable", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn seed_all(State(state): State<AppState>) -> Result<Json<SeedReport>, ServiceError> {
    let report = state.demo_service().seed_all().await?;
    Ok(Json(report))
}

/// Wipe every managed table
#[utoipa::path(
    post,
    path = "/api/Demos/reset",
    responses(
        (status = 200, description = "Per-table delete counts", body = ResetReport),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn reset_all(State(state): State<AppState>) -> Result<Json<ResetReport>, ServiceError> {
    let report = state.demo_service().reset_all().await?;
    Ok(Json(report))
}

/// Create a demo with its supply chain manager
#[utoipa::path(
    post,
    path = "/api/Demos",
    request_body = CreateDemoRequest,
    responses(
        (status = 200, description = "Demo created", body = DemoView,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid name", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn create_demo(
    State(state): State<AppState>,
    payload: Result<Json<CreateDemoRequest>, JsonRejection>,
) -> Result<Json<DemoView>, ServiceError> {
    let payload = json_body(payload)?;
    payload.validate()?;
    let demo = state.demo_service().create_demo(&payload.name).await?;
    Ok(Json(demo.into()))
}

/// Look up a demo by guid
#[utoipa::path(
    get,
    path = "/api/Demos/findByGuid/{guid}",
    params(("guid" = String, Path, description = "Demo guid")),
    responses(
        (status = 200, description = "Demo with users and roles", body = DemoView),
        (status = 404, description = "No Demo with this guid", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn find_by_guid(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<DemoView>, ServiceError> {
    let demo = state.demo_service().find_by_guid(&guid).await?;
    Ok(Json(demo.into()))
}

/// Retailers visible to a demo
#[utoipa::path(
    get,
    path = "/api/Demos/{guid}/retailers",
    params(("guid" = String, Path, description = "Demo guid")),
    responses(
        (status = 200, description = "Retailers owned by the demo or unclaimed", body = [RetailerView]),
        (status = 404, description = "No Demo with this guid", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn list_retailers(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<Json<Vec<RetailerView>>, ServiceError> {
    let retailers = state.demo_service().list_retailers(&guid).await?;
    Ok(Json(retailers.into_iter().map(RetailerView::from).collect()))
}

/// Issue an access token for a demo user
#[utoipa::path(
    post,
    path = "/api/Demos/{guid}/loginAs",
    params(
        ("guid" = String, Path, description = "Demo guid"),
        ("userId" = Option<i32>, Query, description = "User to log in as; may be sent in the body instead")
    ),
    request_body(content = LoginAsRequest, description = "Optional; userId may be given in the query instead"),
    responses(
        (status = 200, description = "Access token", body = AccessToken),
        (status = 400, description = "Missing or malformed userId", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown demo or user", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn login_as(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<LoginAsRequest>,
    body: Result<Json<LoginAsRequest>, JsonRejection>,
) -> Result<Json<AccessToken>, ServiceError> {
    let body = optional_json_body(body)?;
    let user_id = resolve_id("userId", query.user_id, body.and_then(|b| b.user_id))?;
    let token = state.demo_service().login_as(&guid, user_id).await?;
    Ok(Json(token))
}

/// Delete a demo and every user it owns
#[utoipa::path(
    delete,
    path = "/api/Demos/{guid}",
    params(("guid" = String, Path, description = "Demo guid")),
    responses(
        (status = 204, description = "Demo deleted"),
        (status = 404, description = "No Demo with this guid", body = crate::errors::ErrorResponse),
        (status = 500, description = "Some demo users could not be removed", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn delete_by_guid(
    State(state): State<AppState>,
    Path(guid): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.demo_service().delete_by_guid(&guid).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a retail store manager for one of the demo's retailers
#[utoipa::path(
    post,
    path = "/api/Demos/{guid}/createUser",
    params(
        ("guid" = String, Path, description = "Demo guid"),
        ("retailerId" = Option<i32>, Query, description = "Retailer to manage; may be sent in the body instead")
    ),
    request_body(content = CreateUserRequest, description = "Optional; retailerId may be given in the query instead"),
    responses(
        (status = 200, description = "Created user with roles", body = UserView),
        (status = 400, description = "Retailer belongs to another demo, or retailerId missing", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown demo or retailer", body = crate::errors::ErrorResponse)
    ),
    tag = "Demos"
)]
pub async fn create_retail_manager(
    State(state): State<AppState>,
    Path(guid): Path<String>,
    Query(query): Query<CreateUserRequest>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserView>, ServiceError> {
    let body = optional_json_body(body)?;
    let retailer_id = resolve_id(
        "retailerId",
        query.retailer_id,
        body.and_then(|b| b.retailer_id),
    )?;
    let manager = state
        .demo_service()
        .create_retail_manager_by_guid(&guid, retailer_id)
        .await?;
    Ok(Json(manager.into()))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_demo))
        .route("/seed", post(seed_all))
        .route("/reset", post(reset_all))
        .route("/findByGuid/:guid", get(find_by_guid))
        .route("/:guid", delete(delete_by_guid))
        .route("/:guid/retailers", get(list_retailers))
        .route("/:guid/loginAs", post(login_as))
        .route("/:guid/createUser", post(create_retail_manager))
}
