use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedRider,
    models::auth::{AuthResponse, LoginRiderPayload, Rider},
};

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRiderPayload,
    responses(
        (status = 200, description = "Token JWT do entregador", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginRiderPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let token = app_state
        .auth_service
        .login_rider(&payload.input, &payload.password)
        .await?;

    Ok(Json(AuthResponse { token }))
}

// GET /api/riders/me
#[utoipa::path(
    get,
    path = "/api/riders/me",
    tag = "Riders",
    responses(
        (status = 200, description = "Entregador autenticado", body = Rider)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(AuthenticatedRider(rider): AuthenticatedRider) -> Json<Rider> {
    Json(rider)
}
