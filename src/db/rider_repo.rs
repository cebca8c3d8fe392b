use sqlx::PgPool;
use uuid::Uuid;
use crate::{common::error::AppError, models::auth::Rider};

const RIDER_COLUMNS: &str = "id, username, email, name, password_hash, created_at, updated_at";

// O repositório de entregadores, responsável pela tabela 'riders'
#[derive(Clone)]
pub struct RiderRepository {
    pool: PgPool,
}

impl RiderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // O login aceita tanto o nome de usuário quanto o e-mail
    pub async fn find_by_username_or_email(&self, input: &str) -> Result<Option<Rider>, AppError> {
        let sql = format!("SELECT {RIDER_COLUMNS} FROM riders WHERE username = $1 OR email = $1 LIMIT 1");
        let rider = sqlx::query_as::<_, Rider>(&sql)
            .bind(input)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rider)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Rider>, AppError> {
        let sql = format!("SELECT {RIDER_COLUMNS} FROM riders WHERE id = $1");
        let rider = sqlx::query_as::<_, Rider>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rider)
    }
}
