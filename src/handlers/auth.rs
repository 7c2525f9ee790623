use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, validate_input};
use crate::handlers::AppState;
use crate::services::users::{NewUser, UserProfile};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Login request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    #[schema(example = "shopper@example.com")]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Signup request payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserProfile,
}

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/signup", post(signup))
}

/// Exact-match credential check against the user repository. The
/// response never carries the password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_input(&payload)?;

    let user = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(map_service_error)?;

    Ok(Json(AuthResponse {
        success: true,
        user,
    }))
}

/// Register a new user. A duplicate email is rejected with 400.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_input(&payload)?;

    let user = state
        .services
        .auth
        .signup(NewUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        })
        .await
        .map_err(map_service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user,
        }),
    ))
}
