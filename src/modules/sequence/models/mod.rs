pub mod document_series;

pub use document_series::DocumentSeries;
