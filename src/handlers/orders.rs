// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedRider,
    models::{
        collection::PackageStatus,
        order::{OrderDetail, OrderSummary},
    },
};

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedidos pagos aguardando entregador", body = [OrderSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_unassigned(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let orders = app_state.order_service.list_unassigned().await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderStatusQuery {
    /// Sem filtro retorna todos os pedidos do entregador
    pub status: Option<PackageStatus>,
}

// GET /api/orders/mine
#[utoipa::path(
    get,
    path = "/api/orders/mine",
    tag = "Orders",
    params(OrderStatusQuery),
    responses(
        (status = 200, description = "Pedidos do entregador autenticado", body = [OrderSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    AuthenticatedRider(rider): AuthenticatedRider,
    Query(query): Query<OrderStatusQuery>,
) -> Result<Json<Vec<OrderSummary>>, AppError> {
    let orders = app_state
        .order_service
        .list_for_rider(rider.id, query.status)
        .await?;
    Ok(Json(orders))
}

// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido com cliente e itens", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = app_state.order_service.get_order(id).await?;
    Ok(Json(order))
}
