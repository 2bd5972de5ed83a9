pub mod config;
pub mod document;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use document::{Document, DocumentStore, InMemoryDocumentStore};
pub use error::{GrievanceError, GrievanceResult};
