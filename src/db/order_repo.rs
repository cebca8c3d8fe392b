// src/db/order_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        collection::PackageStatus,
        order::{CustomerSummary, OrderDetail, OrderSummary, OrderedLine},
    },
};

// Pedido + cliente + ids das linhas; clientes bloqueados nunca aparecem
const ORDER_SUMMARY_SELECT: &str = r#"
    SELECT
        o.id, o.package_status, o.created_at, o.updated_at,
        c.id AS customer_id, c.name AS customer_name,
        c.email AS customer_email, c.address AS customer_address,
        COALESCE(array_agg(po.id ORDER BY po.id) FILTER (WHERE po.id IS NOT NULL), '{}') AS product_ordered_ids
    FROM orders o
    JOIN customers c ON c.id = o.customer_id AND c.blocked = FALSE
    LEFT JOIN products_ordered po ON po.order_id = o.id
"#;

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: Uuid,
    package_status: PackageStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    customer_id: Uuid,
    customer_name: Option<String>,
    customer_email: String,
    customer_address: Option<String>,
    product_ordered_ids: Vec<Uuid>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            package_status: row.package_status,
            customer: CustomerSummary {
                id: row.customer_id,
                name: row.customer_name,
                email: row.customer_email,
                address: row.customer_address,
            },
            product_ordered_ids: row.product_ordered_ids,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderHeaderRow {
    id: Uuid,
    package_status: PackageStatus,
    reason: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    customer_id: Uuid,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pedidos pagos, pendentes e ainda sem entregador.
    pub async fn find_unassigned(&self) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!(
            "{ORDER_SUMMARY_SELECT}
             WHERE o.package_status = 'Pending' AND o.payment_status = 'Done' AND o.rider_id IS NULL
             GROUP BY o.id, c.id
             ORDER BY o.created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_rider(
        &self,
        rider_id: Uuid,
        status: Option<PackageStatus>,
    ) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!(
            "{ORDER_SUMMARY_SELECT}
             WHERE o.rider_id = $1 AND ($2::package_status IS NULL OR o.package_status = $2)
             GROUP BY o.id, c.id
             ORDER BY o.created_at DESC"
        );
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .bind(rider_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let Some(header) = sqlx::query_as::<_, OrderHeaderRow>(
            "SELECT id, package_status, reason, created_at, updated_at, customer_id FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let customer = sqlx::query_as::<_, CustomerSummary>(
            "SELECT id, name, email, address FROM customers WHERE id = $1",
        )
        .bind(header.customer_id)
        .fetch_one(&self.pool)
        .await?;

        let products_ordered = sqlx::query_as::<_, OrderedLine>(
            r#"
            SELECT po.id, po.quantity, p.id AS product_id, p.title, p.main_image_url
            FROM products_ordered po
            JOIN products p ON p.id = po.product_id
            WHERE po.order_id = $1
            ORDER BY po.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderDetail {
            id: header.id,
            package_status: header.package_status,
            reason: header.reason,
            customer,
            products_ordered,
            created_at: header.created_at,
            updated_at: header.updated_at,
        }))
    }
}
