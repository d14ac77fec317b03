pub mod delivery_repository;

pub use delivery_repository::DeliveryRepository;
