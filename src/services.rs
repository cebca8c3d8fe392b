pub mod auth;
pub mod collection_service;
pub mod order_service;
