// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- COLLECTION REQUESTS ---
        handlers::collection::list_unassigned,
        handlers::collection::list_mine,
        handlers::collection::get_request,
        handlers::collection::claim_request,
        handlers::collection::resolve_request,

        // --- ORDERS ---
        handlers::orders::list_unassigned,
        handlers::orders::list_mine,
        handlers::orders::get_order,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Rider,
            models::auth::LoginRiderPayload,
            models::auth::AuthResponse,

            // --- Collection Requests ---
            models::collection::PackageStatus,
            models::collection::Outcome,
            models::collection::ProductStatus,
            models::collection::RiderScope,
            models::collection::CollectionRequest,
            models::collection::Product,
            models::collection::CollectedRecord,
            models::collection::SellerSummary,
            models::collection::CollectionRequestSummary,
            models::collection::CollectionRequestDetail,
            models::collection::Resolution,
            handlers::collection::ResolvePayload,

            // --- Orders ---
            models::order::PaymentStatus,
            models::order::CustomerSummary,
            models::order::OrderSummary,
            models::order::OrderedLine,
            models::order::OrderDetail,
        )
    ),
    tags(
        (name = "Auth", description = "Login dos entregadores"),
        (name = "Riders", description = "Dados do entregador"),
        (name = "Collection Requests", description = "Coletas nos vendedores e conciliação de estoque"),
        (name = "Orders", description = "Consulta de pedidos de clientes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
