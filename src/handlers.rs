pub mod auth;
pub mod collection;
pub mod orders;
