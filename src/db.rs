pub mod task_store;
pub use task_store::TaskStore;
pub mod collection_repo;
pub use collection_repo::CollectionRepository;
pub mod rider_repo;
pub use rider_repo::RiderRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;

#[cfg(test)]
pub mod memory_store;
