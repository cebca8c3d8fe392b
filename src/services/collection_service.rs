// src/services/collection_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    alerts::{alert_key, NotificationSink, COLLECTION_REQUEST_TAG},
    common::error::AppError,
    db::TaskStore,
    models::collection::{
        normalize_reason, CollectionRequest, CollectionRequestDetail, CollectionRequestSummary,
        Outcome, Resolution, RiderScope,
    },
};

/// Ciclo de vida das coletas: `Pending -> Coming -> Done | Failed`.
#[derive(Clone)]
pub struct CollectionService {
    store: Arc<dyn TaskStore>,
    alerts: Arc<dyn NotificationSink>,
}

impl CollectionService {
    pub fn new(store: Arc<dyn TaskStore>, alerts: Arc<dyn NotificationSink>) -> Self {
        Self { store, alerts }
    }

    // --- CONSULTAS ---

    pub async fn list_unassigned(&self) -> Result<Vec<CollectionRequestSummary>, AppError> {
        self.store.find_pending_unassigned().await
    }

    pub async fn list_for_rider(
        &self,
        rider_id: Uuid,
        scope: RiderScope,
    ) -> Result<Vec<CollectionRequestSummary>, AppError> {
        self.store.find_by_rider_and_status(rider_id, scope.statuses()).await
    }

    pub async fn get_request(&self, id: Uuid) -> Result<CollectionRequestDetail, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::CollectionRequestNotFound)
    }

    // --- TRANSIÇÕES ---

    pub async fn claim_request(&self, id: Uuid, rider_id: Uuid) -> Result<CollectionRequest, AppError> {
        match self.store.assign_rider(id, rider_id).await {
            Ok(request) => {
                tracing::info!(request_id = %id, rider_id = %rider_id, "Coleta assumida");
                Ok(request)
            }
            Err(AppError::AlreadyClaimed) => {
                tracing::warn!(request_id = %id, rider_id = %rider_id, "Coleta já tinha entregador");
                Err(AppError::AlreadyClaimed)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn resolve_request(
        &self,
        id: Uuid,
        outcome: Outcome,
        reason: Option<&str>,
    ) -> Result<Resolution, AppError> {
        // Motivo inválido não chega no banco
        let reason = normalize_reason(outcome, reason)?;

        let mut resolution = self
            .store
            .update_status_and_products(id, outcome, reason)
            .await?;

        tracing::info!(
            request_id = %id,
            outcome = ?outcome,
            products = resolution.products.len(),
            audited = resolution.collected.len(),
            "Coleta encerrada"
        );

        // Já está gravado; uma falha aqui só é reportada, nunca desfaz a conclusão
        let key = alert_key(resolution.request.seller_id);
        resolution.alert_signaled = match self.alerts.signal(&key, COLLECTION_REQUEST_TAG).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(request_id = %id, key = %key, "Falha ao sinalizar o vendedor: {}", e);
                false
            }
        };

        Ok(resolution)
    }

    /// Encerra a coleta em nome de um entregador. Só quem assumiu pode encerrar;
    /// coleta ainda sem entregador cai na guarda de estado (`InvalidPrecondition`).
    pub async fn resolve_as_rider(
        &self,
        id: Uuid,
        rider_id: Uuid,
        outcome: Outcome,
        reason: Option<&str>,
    ) -> Result<Resolution, AppError> {
        let detail = self.get_request(id).await?;
        if let Some(assigned) = detail.request.rider_id {
            if assigned != rider_id {
                tracing::warn!(request_id = %id, rider_id = %rider_id, "Coleta pertence a outro entregador");
                return Err(AppError::NotAssignedRider);
            }
        }

        self.resolve_request(id, outcome, reason).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts::memory::MemoryNotificationSink,
        db::memory_store::MemoryTaskStore,
        models::collection::{PackageStatus, ProductStatus},
    };

    struct Harness {
        store: MemoryTaskStore,
        sink: MemoryNotificationSink,
        service: CollectionService,
        seller_id: Uuid,
    }

    async fn harness() -> Harness {
        let store = MemoryTaskStore::new();
        let sink = MemoryNotificationSink::new();
        let service = CollectionService::new(Arc::new(store.clone()), Arc::new(sink.clone()));
        let seller_id = store.insert_seller("Loja A").await;
        Harness { store, sink, service, seller_id }
    }

    #[tokio::test]
    async fn claim_then_done_reconciles_stock_and_audits() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 5, 0).await;
        let rider_a = Uuid::new_v4();

        let claimed = h.service.claim_request(r1, rider_a).await.unwrap();
        assert_eq!(claimed.status, PackageStatus::Coming);
        assert_eq!(claimed.rider_id, Some(rider_a));

        let resolution = h.service.resolve_request(r1, Outcome::Done, None).await.unwrap();

        let product = h.store.product(p1).await.unwrap();
        assert_eq!(product.stock_acquired, 5);
        assert_eq!(product.stock_specified, 0);
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(resolution.request.status, PackageStatus::Done);

        let collected = h.store.collected().await;
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].collection_request_id, r1);
        assert_eq!(collected[0].rider_id, rider_a);
        assert_eq!(collected[0].product_id, p1);
        assert_eq!(collected[0].quantity, 5);

        assert!(resolution.alert_signaled);
        let members = h.sink.members(&alert_key(h.seller_id)).await;
        assert!(members.contains(COLLECTION_REQUEST_TAG));
    }

    #[tokio::test]
    async fn concurrent_claims_have_exactly_one_winner() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let (rider_1, rider_2) = (Uuid::new_v4(), Uuid::new_v4());

        let s1 = h.service.clone();
        let s2 = h.service.clone();
        let t1 = tokio::spawn(async move { s1.claim_request(r1, rider_1).await });
        let t2 = tokio::spawn(async move { s2.claim_request(r1, rider_2).await });
        let (a, b) = (t1.await.unwrap(), t2.await.unwrap());

        let winner = match (&a, &b) {
            (Ok(_), Err(AppError::AlreadyClaimed)) => rider_1,
            (Err(AppError::AlreadyClaimed), Ok(_)) => rider_2,
            other => panic!("esperava exatamente um vencedor, veio {:?}", other),
        };

        let request = h.store.request(r1).await.unwrap();
        assert_eq!(request.rider_id, Some(winner));
        assert_eq!(request.status, PackageStatus::Coming);
    }

    #[tokio::test]
    async fn claim_unknown_request_is_not_found() {
        let h = harness().await;
        let result = h.service.claim_request(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::CollectionRequestNotFound)));
    }

    #[tokio::test]
    async fn failed_with_nothing_acquired_empties_stock() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 4, 0).await;
        let p2 = h.store.insert_product(r1, 2, 0).await;
        h.service.claim_request(r1, Uuid::new_v4()).await.unwrap();

        let resolution = h
            .service
            .resolve_request(r1, Outcome::Failed, Some("reason"))
            .await
            .unwrap();

        for (id, specified) in [(p1, 4), (p2, 2)] {
            let product = h.store.product(id).await.unwrap();
            assert_eq!(product.status, ProductStatus::EmptyStock);
            assert_eq!(product.stock_specified, specified);
        }
        assert_eq!(resolution.request.status, PackageStatus::Failed);
        assert_eq!(resolution.request.reason.as_deref(), Some("reason"));
        // Falha também gera auditoria com a quantidade especificada
        assert_eq!(h.store.collected().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_keeps_availability_of_previous_acquisitions() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 3, 7).await;
        h.service.claim_request(r1, Uuid::new_v4()).await.unwrap();

        h.service
            .resolve_request(r1, Outcome::Failed, Some("loja fechada"))
            .await
            .unwrap();

        let product = h.store.product(p1).await.unwrap();
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(product.stock_acquired, 7);
        assert_eq!(product.stock_specified, 3);
    }

    #[tokio::test]
    async fn failed_without_reason_touches_nothing() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 4, 0).await;
        h.service.claim_request(r1, Uuid::new_v4()).await.unwrap();
        let before = h.store.request(r1).await.unwrap();

        let result = h.service.resolve_request(r1, Outcome::Failed, Some("")).await;

        assert!(matches!(result, Err(AppError::InvalidPrecondition(_))));
        assert_eq!(h.store.request(r1).await.unwrap(), before);
        assert_eq!(h.store.product(p1).await.unwrap().status, ProductStatus::Draft);
        assert!(h.store.collected().await.is_empty());
        assert_eq!(h.sink.calls(), 0);
    }

    #[tokio::test]
    async fn second_resolve_is_rejected_and_changes_nothing() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 5, 0).await;
        h.service.claim_request(r1, Uuid::new_v4()).await.unwrap();
        h.service.resolve_request(r1, Outcome::Done, None).await.unwrap();

        let request_after_first = h.store.request(r1).await.unwrap();
        let product_after_first = h.store.product(p1).await.unwrap();

        let second = h.service.resolve_request(r1, Outcome::Done, None).await;

        assert!(matches!(second, Err(AppError::InvalidPrecondition(_))));
        assert_eq!(h.store.request(r1).await.unwrap(), request_after_first);
        assert_eq!(h.store.product(p1).await.unwrap(), product_after_first);
        assert_eq!(h.store.collected().await.len(), 1);
    }

    #[tokio::test]
    async fn resolve_pending_request_is_rejected() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;

        let result = h.service.resolve_request(r1, Outcome::Done, None).await;
        assert!(matches!(result, Err(AppError::InvalidPrecondition(_))));
    }

    #[tokio::test]
    async fn coming_without_rider_resolves_without_audit() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        h.store.insert_product(r1, 5, 0).await;
        h.store.force_state(r1, PackageStatus::Coming, None).await;

        let resolution = h.service.resolve_request(r1, Outcome::Done, None).await.unwrap();

        assert!(resolution.collected.is_empty());
        assert!(h.store.collected().await.is_empty());
        assert_eq!(resolution.request.status, PackageStatus::Done);
    }

    #[tokio::test]
    async fn sink_failure_is_reported_not_rolled_back() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        h.store.insert_product(r1, 1, 0).await;
        h.service.claim_request(r1, Uuid::new_v4()).await.unwrap();
        h.sink.fail_signals(true);

        let resolution = h.service.resolve_request(r1, Outcome::Done, None).await.unwrap();

        assert!(!resolution.alert_signaled);
        assert_eq!(h.store.request(r1).await.unwrap().status, PackageStatus::Done);
    }

    #[tokio::test]
    async fn listings_follow_scope_and_recency() {
        let h = harness().await;
        let older = h.store.insert_request(h.seller_id, 30).await;
        let newer = h.store.insert_request(h.seller_id, 5).await;
        let mine = h.store.insert_request(h.seller_id, 10).await;
        h.store.insert_product(newer, 1, 0).await;
        let rider = Uuid::new_v4();
        h.service.claim_request(mine, rider).await.unwrap();

        let open: Vec<Uuid> = h.service.list_unassigned().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(open, vec![newer, older]);

        let active = h.service.list_for_rider(rider, RiderScope::Active).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, mine);
        assert!(h.service.list_for_rider(rider, RiderScope::Done).await.unwrap().is_empty());

        let unassigned = h.service.list_unassigned().await.unwrap();
        assert_eq!(unassigned[0].product_ids.len(), 1);
        assert_eq!(unassigned[0].seller.name.as_deref(), Some("Loja A"));
    }

    #[tokio::test]
    async fn only_the_assigned_rider_resolves() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;
        let p1 = h.store.insert_product(r1, 3, 0).await;
        let (owner, intruder) = (Uuid::new_v4(), Uuid::new_v4());
        h.service.claim_request(r1, owner).await.unwrap();
        let before = h.store.request(r1).await.unwrap();
        let product_before = h.store.product(p1).await.unwrap();

        let result = h.service.resolve_as_rider(r1, intruder, Outcome::Done, None).await;
        assert!(matches!(result, Err(AppError::NotAssignedRider)));
        assert_eq!(h.store.request(r1).await.unwrap(), before);
        assert_eq!(h.store.product(p1).await.unwrap(), product_before);
        assert!(h.store.collected().await.is_empty());
        assert_eq!(h.sink.calls(), 0);

        let resolution = h
            .service
            .resolve_as_rider(r1, owner, Outcome::Done, None)
            .await
            .unwrap();
        assert_eq!(resolution.request.status, PackageStatus::Done);
        assert_eq!(resolution.collected.len(), 1);
    }

    #[tokio::test]
    async fn resolve_as_rider_on_pending_is_a_state_error() {
        let h = harness().await;
        let r1 = h.store.insert_request(h.seller_id, 0).await;

        let result = h
            .service
            .resolve_as_rider(r1, Uuid::new_v4(), Outcome::Failed, Some("fechado"))
            .await;

        assert!(matches!(result, Err(AppError::InvalidPrecondition(_))));
        assert_eq!(h.store.request(r1).await.unwrap().status, PackageStatus::Pending);
    }

    #[tokio::test]
    async fn resolve_as_rider_unknown_request_is_not_found() {
        let h = harness().await;
        let result = h
            .service
            .resolve_as_rider(Uuid::new_v4(), Uuid::new_v4(), Outcome::Done, None)
            .await;
        assert!(matches!(result, Err(AppError::CollectionRequestNotFound)));
    }

    #[tokio::test]
    async fn get_request_reports_missing_ids() {
        let h = harness().await;
        let result = h.service.get_request(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::CollectionRequestNotFound)));
    }
}
