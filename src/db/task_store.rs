// src/db/task_store.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::collection::{
        CollectionRequest, CollectionRequestDetail, CollectionRequestSummary, Outcome,
        PackageStatus, Resolution,
    },
};

/// Armazenamento das solicitações de coleta.
///
/// As duas escritas são atômicas:
/// - `assign_rider` só tem efeito se a coleta ainda estiver `Pending` e sem entregador.
/// - `update_status_and_products` grava coleta, produtos e auditoria juntos ou nada.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Coletas pendentes sem entregador, mais novas primeiro.
    async fn find_pending_unassigned(&self) -> Result<Vec<CollectionRequestSummary>, AppError>;

    async fn find_by_rider_and_status(
        &self,
        rider_id: Uuid,
        statuses: &[PackageStatus],
    ) -> Result<Vec<CollectionRequestSummary>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CollectionRequestDetail>, AppError>;

    /// `Pending -> Coming`. Falha com `CollectionRequestNotFound` ou `AlreadyClaimed`.
    async fn assign_rider(&self, id: Uuid, rider_id: Uuid) -> Result<CollectionRequest, AppError>;

    /// `Coming -> Done | Failed` com a conciliação de estoque e a auditoria.
    /// O `reason` já chega normalizado.
    async fn update_status_and_products(
        &self,
        id: Uuid,
        outcome: Outcome,
        reason: Option<String>,
    ) -> Result<Resolution, AppError>;
}
