//! Complaint intake and admin dashboard backend: the complaint store and the
//! REST surface over it.

pub mod auth;
pub mod courses;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod store;

pub use courses::CourseCatalog;
pub use error::ApiError;
pub use handlers::ManagementState;
pub use router::management_router;
pub use store::ComplaintStore;
