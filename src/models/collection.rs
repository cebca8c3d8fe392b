// src/models/collection.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// --- Enums ---

/// Estado de entrega compartilhado por coletas e pedidos (`package_status` no banco).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "package_status")]
pub enum PackageStatus {
    Pending,
    Coming,
    Done,
    Failed,
}

impl PackageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PackageStatus::Done | PackageStatus::Failed)
    }

    /// Só uma coleta pendente pode ser assumida. Qualquer outro estado já tem entregador.
    pub fn ensure_claimable(self) -> Result<(), AppError> {
        match self {
            PackageStatus::Pending => Ok(()),
            _ => Err(AppError::AlreadyClaimed),
        }
    }

    pub fn ensure_resolvable(self) -> Result<(), AppError> {
        match self {
            PackageStatus::Coming => Ok(()),
            other if other.is_terminal() => Err(AppError::InvalidPrecondition(format!(
                "a coleta já foi encerrada como {:?}",
                other
            ))),
            other => Err(AppError::InvalidPrecondition(format!(
                "a coleta está em {:?}; apenas coletas em Coming podem ser concluídas",
                other
            ))),
        }
    }
}

/// Resultado informado pelo entregador ao encerrar uma coleta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Outcome {
    Done,
    Failed,
}

impl From<Outcome> for PackageStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Done => PackageStatus::Done,
            Outcome::Failed => PackageStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_status")]
pub enum ProductStatus {
    Available,
    EmptyStock,
    Draft,
    Unavailable,
}

/// Abas do painel do entregador.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub enum RiderScope {
    #[default]
    Active,
    Done,
    Failed,
}

impl RiderScope {
    pub fn statuses(self) -> &'static [PackageStatus] {
        match self {
            RiderScope::Active => &[PackageStatus::Coming, PackageStatus::Pending],
            RiderScope::Done => &[PackageStatus::Done],
            RiderScope::Failed => &[PackageStatus::Failed],
        }
    }
}

// --- Linhas do banco ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub rider_id: Option<Uuid>,
    pub status: PackageStatus,
    #[schema(example = "Loja fechada")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub collection_request_id: Option<Uuid>,
    #[schema(example = "Camiseta Azul M")]
    pub title: String,
    pub main_image_url: Option<String>,
    pub status: ProductStatus,
    #[schema(example = 5)]
    pub stock_specified: i32,
    #[schema(example = 0)]
    pub stock_acquired: i32,
}

/// Registro de auditoria. Nunca é alterado depois de criado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectedRecord {
    pub id: Uuid,
    pub collection_request_id: Uuid,
    pub rider_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

// --- Projeções de leitura ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequestSummary {
    pub id: Uuid,
    pub status: PackageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub seller: SellerSummary,
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequestDetail {
    #[serde(flatten)]
    pub request: CollectionRequest,
    pub seller: SellerSummary,
    pub products: Vec<Product>,
}

// --- Regras de conciliação de estoque ---

/// Novos valores de um produto depois de encerrar a coleta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductUpdate {
    pub product_id: Uuid,
    pub status: ProductStatus,
    pub stock_specified: i32,
    pub stock_acquired: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCollectedRecord {
    pub collection_request_id: Uuid,
    pub rider_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

impl Product {
    pub fn reconcile(&self, outcome: Outcome) -> ProductUpdate {
        match outcome {
            // Tudo que foi especificado conta como coletado
            Outcome::Done => ProductUpdate {
                product_id: self.id,
                status: ProductStatus::Available,
                stock_specified: 0,
                stock_acquired: self.stock_specified,
            },
            Outcome::Failed => ProductUpdate {
                product_id: self.id,
                status: if self.stock_acquired > 0 {
                    ProductStatus::Available
                } else {
                    ProductStatus::EmptyStock
                },
                stock_specified: self.stock_specified,
                stock_acquired: self.stock_acquired,
            },
        }
    }

    pub fn apply(&mut self, update: &ProductUpdate) {
        self.status = update.status;
        self.stock_specified = update.stock_specified;
        self.stock_acquired = update.stock_acquired;
    }
}

/// O motivo só é guardado em falhas, e nelas é obrigatório.
pub fn normalize_reason(outcome: Outcome, reason: Option<&str>) -> Result<Option<String>, AppError> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    match (outcome, reason) {
        (Outcome::Failed, None) => Err(AppError::InvalidPrecondition(
            "o motivo é obrigatório quando a coleta falha".into(),
        )),
        (Outcome::Failed, Some(r)) => Ok(Some(r.to_string())),
        (Outcome::Done, _) => Ok(None),
    }
}

/// Tudo o que uma conclusão grava, calculado antes de qualquer escrita.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPlan {
    pub status: PackageStatus,
    pub reason: Option<String>,
    pub product_updates: Vec<ProductUpdate>,
    pub audit_rows: Vec<NewCollectedRecord>,
}

impl ResolutionPlan {
    pub fn build(
        request: &CollectionRequest,
        products: &[Product],
        outcome: Outcome,
        reason: Option<String>,
    ) -> Result<Self, AppError> {
        request.status.ensure_resolvable()?;

        let product_updates = products.iter().map(|p| p.reconcile(outcome)).collect();

        // A quantidade auditada é a especificada ANTES da atualização (em falhas também)
        let audit_rows = match request.rider_id {
            Some(rider_id) => products
                .iter()
                .map(|p| NewCollectedRecord {
                    collection_request_id: request.id,
                    rider_id,
                    product_id: p.id,
                    quantity: p.stock_specified,
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            status: outcome.into(),
            reason,
            product_updates,
            audit_rows,
        })
    }
}

/// Retorno de uma conclusão de coleta.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub request: CollectionRequest,
    pub products: Vec<Product>,
    pub collected: Vec<CollectedRecord>,
    /// `false` quando o alerta ao vendedor não pôde ser enviado (a conclusão já foi gravada).
    pub alert_signaled: bool,
}
