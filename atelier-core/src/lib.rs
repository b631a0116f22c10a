//! atelier-core: Shared infrastructure for the atelier backend.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use mongodb;
pub use serde;
pub use validator;
