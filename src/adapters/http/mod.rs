//! HTTP adapter - REST API surface.
//!
//! Three endpoints: message-only chat, upload-and-chat, and liveness.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::app_router;
