//! HTTP subsystem of the pong service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → handlers.rs
//!         GET  /api/pong     → RemoteAdmissionController → 200 "World" | 429
//!         POST /api/records  → RecordStore::consume (idempotent by request id)
//!         GET  /api/records  → RecordStore::list
//!         GET  /health
//! ```

pub mod handlers;
pub mod server;

pub use handlers::{PONG_BODY, PONG_DENIED_BODY};
pub use server::{AppState, PongServer};
