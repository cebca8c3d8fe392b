//! TaskStore em memória, usado nos testes dos serviços.
//!
//! Um único Mutex protege todo o estado, então cada operação é atômica.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::task_store::TaskStore,
    models::collection::{
        CollectedRecord, CollectionRequest, CollectionRequestDetail, CollectionRequestSummary,
        Outcome, PackageStatus, Product, ProductStatus, Resolution, ResolutionPlan, SellerSummary,
    },
};

#[derive(Default)]
struct MemoryState {
    sellers: HashMap<Uuid, SellerSummary>,
    requests: HashMap<Uuid, CollectionRequest>,
    products: HashMap<Uuid, Product>,
    collected: Vec<CollectedRecord>,
}

impl MemoryState {
    fn products_of(&self, request_id: Uuid) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .values()
            .filter(|p| p.collection_request_id == Some(request_id))
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id);
        products
    }

    fn summary(&self, request: &CollectionRequest) -> CollectionRequestSummary {
        CollectionRequestSummary {
            id: request.id,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
            seller: self.sellers[&request.seller_id].clone(),
            product_ids: self.products_of(request.id).iter().map(|p| p.id).collect(),
        }
    }

    fn summaries<F>(&self, filter: F) -> Vec<CollectionRequestSummary>
    where
        F: Fn(&CollectionRequest) -> bool,
    {
        let mut requests: Vec<&CollectionRequest> =
            self.requests.values().filter(|r| filter(r)).collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        requests.into_iter().map(|r| self.summary(r)).collect()
    }
}

#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_seller(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let seller = SellerSummary {
            id,
            name: Some(name.to_string()),
            address: Some(format!("Rua {name}")),
            phone: None,
        };
        self.state.lock().await.sellers.insert(id, seller);
        id
    }

    /// Cria uma coleta `Pending`. `age_minutes` define a antiguidade para ordenar listagens.
    pub async fn insert_request(&self, seller_id: Uuid, age_minutes: i64) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        let request = CollectionRequest {
            id,
            seller_id,
            rider_id: None,
            status: PackageStatus::Pending,
            reason: None,
            created_at,
            updated_at: created_at,
        };
        self.state.lock().await.requests.insert(id, request);
        id
    }

    pub async fn insert_product(&self, request_id: Uuid, specified: i32, acquired: i32) -> Uuid {
        let mut state = self.state.lock().await;
        let seller_id = state.requests[&request_id].seller_id;
        let id = Uuid::new_v4();
        let product = Product {
            id,
            seller_id,
            collection_request_id: Some(request_id),
            title: format!("Produto {specified}"),
            main_image_url: None,
            status: ProductStatus::Draft,
            stock_specified: specified,
            stock_acquired: acquired,
        };
        state.products.insert(id, product);
        id
    }

    /// Força um estado arbitrário, inclusive os que o CHECK do Postgres impediria.
    pub async fn force_state(&self, request_id: Uuid, status: PackageStatus, rider_id: Option<Uuid>) {
        let mut state = self.state.lock().await;
        if let Some(request) = state.requests.get_mut(&request_id) {
            request.status = status;
            request.rider_id = rider_id;
        }
    }

    pub async fn request(&self, id: Uuid) -> Option<CollectionRequest> {
        self.state.lock().await.requests.get(&id).cloned()
    }

    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.state.lock().await.products.get(&id).cloned()
    }

    pub async fn collected(&self) -> Vec<CollectedRecord> {
        self.state.lock().await.collected.clone()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_pending_unassigned(&self) -> Result<Vec<CollectionRequestSummary>, AppError> {
        let state = self.state.lock().await;
        Ok(state.summaries(|r| r.status == PackageStatus::Pending && r.rider_id.is_none()))
    }

    async fn find_by_rider_and_status(
        &self,
        rider_id: Uuid,
        statuses: &[PackageStatus],
    ) -> Result<Vec<CollectionRequestSummary>, AppError> {
        let state = self.state.lock().await;
        Ok(state.summaries(|r| r.rider_id == Some(rider_id) && statuses.contains(&r.status)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CollectionRequestDetail>, AppError> {
        let state = self.state.lock().await;
        Ok(state.requests.get(&id).map(|request| CollectionRequestDetail {
            request: request.clone(),
            seller: state.sellers[&request.seller_id].clone(),
            products: state.products_of(id),
        }))
    }

    async fn assign_rider(&self, id: Uuid, rider_id: Uuid) -> Result<CollectionRequest, AppError> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .get_mut(&id)
            .ok_or(AppError::CollectionRequestNotFound)?;

        request.status.ensure_claimable()?;
        if request.rider_id.is_some() {
            return Err(AppError::AlreadyClaimed);
        }

        request.rider_id = Some(rider_id);
        request.status = PackageStatus::Coming;
        request.updated_at = Utc::now();
        Ok(request.clone())
    }

    async fn update_status_and_products(
        &self,
        id: Uuid,
        outcome: Outcome,
        reason: Option<String>,
    ) -> Result<Resolution, AppError> {
        let mut state = self.state.lock().await;
        let request = state
            .requests
            .get(&id)
            .cloned()
            .ok_or(AppError::CollectionRequestNotFound)?;
        let products = state.products_of(id);

        // Plano completo antes de tocar no estado
        let plan = ResolutionPlan::build(&request, &products, outcome, reason)?;
        let now = Utc::now();

        let mut updated_products = Vec::with_capacity(plan.product_updates.len());
        for update in &plan.product_updates {
            if let Some(product) = state.products.get_mut(&update.product_id) {
                product.apply(update);
                updated_products.push(product.clone());
            }
        }

        let mut collected = Vec::with_capacity(plan.audit_rows.len());
        for row in &plan.audit_rows {
            let record = CollectedRecord {
                id: Uuid::new_v4(),
                collection_request_id: row.collection_request_id,
                rider_id: row.rider_id,
                product_id: row.product_id,
                quantity: row.quantity,
                created_at: now,
            };
            state.collected.push(record.clone());
            collected.push(record);
        }

        let request = match state.requests.get_mut(&id) {
            Some(request) => {
                request.status = plan.status;
                request.reason = plan.reason;
                request.updated_at = now;
                request.clone()
            }
            None => return Err(AppError::CollectionRequestNotFound),
        };

        Ok(Resolution {
            request,
            products: updated_products,
            collected,
            alert_signaled: false,
        })
    }
}
