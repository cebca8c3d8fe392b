// src/services/order_service.rs
//
// Consultas de pedidos. O painel não altera pedidos.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::{
        collection::PackageStatus,
        order::{OrderDetail, OrderSummary},
    },
};

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
}

impl OrderService {
    pub fn new(repo: OrderRepository) -> Self {
        Self { repo }
    }

    pub async fn list_unassigned(&self) -> Result<Vec<OrderSummary>, AppError> {
        self.repo.find_unassigned().await
    }

    pub async fn list_for_rider(
        &self,
        rider_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<OrderSummary>, AppError> {
        self.repo.find_by_rider(rider_id, status).await
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetail, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::OrderNotFound)
    }
}
