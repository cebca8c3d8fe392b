// src/models/order.rs
//
// Pedidos de clientes: somente leitura neste painel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::collection::PackageStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub package_status: PackageStatus,
    pub customer: CustomerSummary,
    pub product_ordered_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderedLine {
    pub id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    pub product_id: Uuid,
    pub title: String,
    pub main_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: Uuid,
    pub package_status: PackageStatus,
    pub reason: Option<String>,
    pub customer: CustomerSummary,
    pub products_ordered: Vec<OrderedLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
