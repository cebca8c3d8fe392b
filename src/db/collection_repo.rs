// src/db/collection_repo.rs

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::task_store::TaskStore,
    models::collection::{
        CollectedRecord, CollectionRequest, CollectionRequestDetail, CollectionRequestSummary,
        NewCollectedRecord, Outcome, PackageStatus, Product, ProductUpdate, Resolution,
        ResolutionPlan, SellerSummary,
    },
};

const REQUEST_COLUMNS: &str = "id, seller_id, rider_id, status, reason, created_at, updated_at";

const PRODUCT_COLUMNS: &str = "id, seller_id, collection_request_id, title, main_image_url, \
                               status, stock_specified, stock_acquired";

// Listagem: coleta + vendedor + ids dos produtos numa linha só
const SUMMARY_SELECT: &str = r#"
    SELECT
        cr.id, cr.status, cr.created_at, cr.updated_at,
        s.id AS seller_id, s.name AS seller_name,
        s.address AS seller_address, s.phone AS seller_phone,
        COALESCE(array_agg(p.id ORDER BY p.id) FILTER (WHERE p.id IS NOT NULL), '{}') AS product_ids
    FROM collection_requests cr
    JOIN sellers s ON s.id = cr.seller_id
    LEFT JOIN products p ON p.collection_request_id = cr.id
"#;

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    status: PackageStatus,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    seller_id: Uuid,
    seller_name: Option<String>,
    seller_address: Option<String>,
    seller_phone: Option<String>,
    product_ids: Vec<Uuid>,
}

impl From<SummaryRow> for CollectionRequestSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
            seller: SellerSummary {
                id: row.seller_id,
                name: row.seller_name,
                address: row.seller_address,
                phone: row.seller_phone,
            },
            product_ids: row.product_ids,
        }
    }
}

#[derive(Clone)]
pub struct CollectionRepository {
    pool: PgPool,
}

impl CollectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_request<'e, E>(executor: E, id: Uuid) -> Result<Option<CollectionRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM collection_requests WHERE id = $1 FOR UPDATE");
        let request = sqlx::query_as::<_, CollectionRequest>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    // Ordem fixa por id para que dois bloqueios concorrentes não entrem em deadlock
    async fn lock_products<'e, E>(executor: E, request_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE collection_request_id = $1 ORDER BY id FOR UPDATE"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(request_id)
            .fetch_all(executor)
            .await?;
        Ok(products)
    }

    async fn apply_product_update<'e, E>(executor: E, update: &ProductUpdate) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE products
            SET status = $2, stock_specified = $3, stock_acquired = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(update.product_id)
            .bind(update.status)
            .bind(update.stock_specified)
            .bind(update.stock_acquired)
            .fetch_one(executor)
            .await?;
        Ok(product)
    }

    async fn record_collected<'e, E>(executor: E, row: &NewCollectedRecord) -> Result<CollectedRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, CollectedRecord>(
            r#"
            INSERT INTO products_collected (collection_request_id, rider_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING id, collection_request_id, rider_id, product_id, quantity, created_at
            "#,
        )
        .bind(row.collection_request_id)
        .bind(row.rider_id)
        .bind(row.product_id)
        .bind(row.quantity)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    async fn set_request_status<'e, E>(
        executor: E,
        id: Uuid,
        status: PackageStatus,
        reason: Option<&str>,
    ) -> Result<CollectionRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE collection_requests
            SET status = $2, reason = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let request = sqlx::query_as::<_, CollectionRequest>(&sql)
            .bind(id)
            .bind(status)
            .bind(reason)
            .fetch_one(executor)
            .await?;
        Ok(request)
    }
}

#[async_trait]
impl TaskStore for CollectionRepository {
    async fn find_pending_unassigned(&self) -> Result<Vec<CollectionRequestSummary>, AppError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE cr.status = 'Pending' AND cr.rider_id IS NULL
             GROUP BY cr.id, s.id
             ORDER BY cr.created_at DESC"
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_rider_and_status(
        &self,
        rider_id: Uuid,
        statuses: &[PackageStatus],
    ) -> Result<Vec<CollectionRequestSummary>, AppError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE cr.rider_id = $1 AND cr.status = ANY($2)
             GROUP BY cr.id, s.id
             ORDER BY cr.created_at DESC"
        );
        let rows = sqlx::query_as::<_, SummaryRow>(&sql)
            .bind(rider_id)
            .bind(statuses)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CollectionRequestDetail>, AppError> {
        // Snapshot único: coleta e produtos vêm do mesmo estado confirmado
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {REQUEST_COLUMNS} FROM collection_requests WHERE id = $1");
        let Some(request) = sqlx::query_as::<_, CollectionRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let seller = sqlx::query_as::<_, SellerSummary>(
            "SELECT id, name, address, phone FROM sellers WHERE id = $1",
        )
        .bind(request.seller_id)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE collection_request_id = $1 ORDER BY id"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(CollectionRequestDetail {
            request,
            seller,
            products,
        }))
    }

    async fn assign_rider(&self, id: Uuid, rider_id: Uuid) -> Result<CollectionRequest, AppError> {
        // A guarda de estado fica no próprio UPDATE: só um entregador vence
        let sql = format!(
            r#"
            UPDATE collection_requests
            SET rider_id = $2, status = 'Coming', updated_at = NOW()
            WHERE id = $1 AND status = 'Pending' AND rider_id IS NULL
            RETURNING {REQUEST_COLUMNS}
            "#
        );
        let claimed = sqlx::query_as::<_, CollectionRequest>(&sql)
            .bind(id)
            .bind(rider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_foreign_key_violation() {
                        return AppError::RiderNotFound;
                    }
                }
                e.into()
            })?;

        if let Some(request) = claimed {
            return Ok(request);
        }

        let status = sqlx::query_scalar::<_, PackageStatus>(
            "SELECT status FROM collection_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::CollectionRequestNotFound)?;

        // Zero linhas com a coleta existente: alguém já assumiu
        status.ensure_claimable()?;
        Err(AppError::AlreadyClaimed)
    }

    async fn update_status_and_products(
        &self,
        id: Uuid,
        outcome: Outcome,
        reason: Option<String>,
    ) -> Result<Resolution, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut *tx, id)
            .await?
            .ok_or(AppError::CollectionRequestNotFound)?;
        let products = Self::lock_products(&mut *tx, id).await?;

        // Se a guarda falhar aqui o tx é descartado sem commit (rollback)
        let plan = ResolutionPlan::build(&request, &products, outcome, reason)?;

        let mut updated_products = Vec::with_capacity(plan.product_updates.len());
        for update in &plan.product_updates {
            updated_products.push(Self::apply_product_update(&mut *tx, update).await?);
        }

        let mut collected = Vec::with_capacity(plan.audit_rows.len());
        for row in &plan.audit_rows {
            collected.push(Self::record_collected(&mut *tx, row).await?);
        }

        let request = Self::set_request_status(&mut *tx, id, plan.status, plan.reason.as_deref()).await?;

        tx.commit().await?;

        Ok(Resolution {
            request,
            products: updated_products,
            collected,
            alert_signaled: false,
        })
    }
}
