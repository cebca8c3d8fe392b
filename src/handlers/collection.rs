// src/handlers/collection.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedRider,
    models::collection::{
        CollectionRequest, CollectionRequestDetail, CollectionRequestSummary, Outcome,
        Resolution, RiderScope,
    },
};

// =============================================================================
//  1. CONSULTAS
// =============================================================================

// GET /api/collection-requests
#[utoipa::path(
    get,
    path = "/api/collection-requests",
    tag = "Collection Requests",
    responses(
        (status = 200, description = "Coletas pendentes sem entregador (mais novas primeiro)", body = [CollectionRequestSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_unassigned(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CollectionRequestSummary>>, AppError> {
    let requests = app_state.collection_service.list_unassigned().await?;
    Ok(Json(requests))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ScopeQuery {
    /// Active (padrão), Done ou Failed
    #[serde(default)]
    pub scope: RiderScope,
}

// GET /api/collection-requests/mine?scope=Active
#[utoipa::path(
    get,
    path = "/api/collection-requests/mine",
    tag = "Collection Requests",
    params(ScopeQuery),
    responses(
        (status = 200, description = "Coletas do entregador autenticado", body = [CollectionRequestSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    AuthenticatedRider(rider): AuthenticatedRider,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<Vec<CollectionRequestSummary>>, AppError> {
    let requests = app_state
        .collection_service
        .list_for_rider(rider.id, query.scope)
        .await?;
    Ok(Json(requests))
}

// GET /api/collection-requests/{id}
#[utoipa::path(
    get,
    path = "/api/collection-requests/{id}",
    tag = "Collection Requests",
    params(("id" = Uuid, Path, description = "ID da coleta")),
    responses(
        (status = 200, description = "Coleta com vendedor e produtos", body = CollectionRequestDetail),
        (status = 404, description = "Coleta não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CollectionRequestDetail>, AppError> {
    let detail = app_state.collection_service.get_request(id).await?;
    Ok(Json(detail))
}

// =============================================================================
//  2. TRANSIÇÕES
// =============================================================================

// POST /api/collection-requests/{id}/claim
#[utoipa::path(
    post,
    path = "/api/collection-requests/{id}/claim",
    tag = "Collection Requests",
    params(("id" = Uuid, Path, description = "ID da coleta")),
    responses(
        (status = 200, description = "Coleta assumida (Pending -> Coming)", body = CollectionRequest),
        (status = 404, description = "Coleta não encontrada"),
        (status = 409, description = "Outro entregador assumiu primeiro")
    ),
    security(("api_jwt" = []))
)]
pub async fn claim_request(
    State(app_state): State<AppState>,
    AuthenticatedRider(rider): AuthenticatedRider,
    Path(id): Path<Uuid>,
) -> Result<Json<CollectionRequest>, AppError> {
    let request = app_state.collection_service.claim_request(id, rider.id).await?;
    Ok(Json(request))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvePayload {
    #[schema(example = "Failed")]
    pub outcome: Outcome,

    #[validate(length(max = 1000, message = "O motivo deve ter no máximo 1000 caracteres."))]
    #[schema(example = "Loja fechada no horário combinado")]
    pub reason: Option<String>,
}

// POST /api/collection-requests/{id}/resolve
#[utoipa::path(
    post,
    path = "/api/collection-requests/{id}/resolve",
    tag = "Collection Requests",
    request_body = ResolvePayload,
    params(("id" = Uuid, Path, description = "ID da coleta")),
    responses(
        (status = 200, description = "Coleta encerrada com estoque conciliado", body = Resolution),
        (status = 403, description = "A coleta pertence a outro entregador"),
        (status = 404, description = "Coleta não encontrada"),
        (status = 422, description = "Coleta não está em Coming ou falta o motivo")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_request(
    State(app_state): State<AppState>,
    AuthenticatedRider(rider): AuthenticatedRider,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolvePayload>,
) -> Result<Json<Resolution>, AppError> {
    payload.validate()?;

    let resolution = app_state
        .collection_service
        .resolve_as_rider(id, rider.id, payload.outcome, payload.reason.as_deref())
        .await?;

    Ok(Json(resolution))
}
