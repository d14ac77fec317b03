pub mod inventory_repository;

pub use inventory_repository::InventoryRepository;
