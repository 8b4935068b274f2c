//! Cabinet API Library
//!
//! Access control, the upload pipeline, listing and the axum HTTP surface over the
//! cabinet stores.

mod api_doc;
mod handlers;
pub mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use setup::{build_app, initialize_app};
pub use state::AppState;
