pub mod line_item_repository;

pub use line_item_repository::LineItemRepository;
