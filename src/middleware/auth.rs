use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::Rider,
};

// O middleware em si: valida o Bearer e deixa o entregador nos "extensions"
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidToken)?;

    let rider = app_state.auth_service.validate_token(token).await?;

    request.extensions_mut().insert(rider);
    Ok(next.run(request).await)
}

// Extrator para obter o entregador autenticado diretamente nos handlers
pub struct AuthenticatedRider(pub Rider);

impl<S> FromRequestParts<S> for AuthenticatedRider
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Rider>()
            .cloned()
            .map(AuthenticatedRider)
            .ok_or(AppError::InvalidToken)
    }
}
