// src/alerts.rs
//
// Sinal para o vendedor de que algo aconteceu com as coletas dele.
// Quem consome o alerta não é problema deste serviço.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use uuid::Uuid;

use crate::common::error::AppError;

pub const COLLECTION_REQUEST_TAG: &str = "collection_request";

pub fn alert_key(seller_id: Uuid) -> String {
    format!("alerts:{seller_id}")
}

/// Destino dos alertas. Repetir o mesmo (key, tag) não cria uma segunda entrada.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn signal(&self, key: &str, tag: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisNotificationSink {
    conn: ConnectionManager,
}

impl RedisNotificationSink {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl NotificationSink for RedisNotificationSink {
    async fn signal(&self, key: &str, tag: &str) -> Result<(), AppError> {
        // SADD: um conjunto por vendedor, então sinais repetidos colapsam
        let mut conn = self.conn.clone();
        conn.sadd::<_, _, ()>(key, tag).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    pub struct MemoryNotificationSink {
        sets: Arc<Mutex<HashMap<String, HashSet<String>>>>,
        calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    impl MemoryNotificationSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_signals(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub async fn members(&self, key: &str) -> HashSet<String> {
            self.sets.lock().await.get(key).cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl NotificationSink for MemoryNotificationSink {
        async fn signal(&self, key: &str, tag: &str) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::InternalServerError(anyhow::anyhow!(
                    "destino de alertas indisponível"
                )));
            }
            self.sets
                .lock()
                .await
                .entry(key.to_string())
                .or_default()
                .insert(tag.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn repeated_signals_collapse_per_key() {
        let sink = MemoryNotificationSink::new();
        let key = alert_key(Uuid::nil());

        sink.signal(&key, COLLECTION_REQUEST_TAG).await.unwrap();
        sink.signal(&key, COLLECTION_REQUEST_TAG).await.unwrap();

        assert_eq!(sink.calls(), 2);
        assert_eq!(sink.members(&key).await.len(), 1);
        assert_eq!(key, "alerts:00000000-0000-0000-0000-000000000000");
    }
}
