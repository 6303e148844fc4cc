//! HTTP adapter (axum).
//!
//! Exposes the codec and the chat service from `mcg-core`:
//! `GET /`, `GET /health`, `POST /api/morse`, `POST /api/chat`.

pub mod handlers;
pub mod router;

pub use router::{build_router, serve, AppState};
