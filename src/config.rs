// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    alerts::RedisNotificationSink,
    db::{CollectionRepository, OrderRepository, RiderRepository},
    services::{auth::AuthService, collection_service::CollectionService, order_service::OrderService},
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub redis_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} deve ser definida"));

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS inválido: {raw}"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            redis_url: required("REDIS_URL")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_max_connections,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub collection_service: CollectionService,
    pub order_service: OrderService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let alerts = RedisNotificationSink::connect(&config.redis_url)
            .await
            .context("Falha ao conectar ao Redis")?;

        tracing::info!("✅ Conexão com o Redis estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let rider_repo = RiderRepository::new(db_pool.clone());
        let auth_service = AuthService::new(rider_repo, config.jwt_secret.clone());
        let collection_service = CollectionService::new(
            Arc::new(CollectionRepository::new(db_pool.clone())),
            Arc::new(alerts),
        );
        let order_service = OrderService::new(OrderRepository::new(db_pool.clone()));

        Ok(Self {
            db_pool,
            auth_service,
            collection_service,
            order_service,
        })
    }
}
