//! HTTP server for the DocQA question-answering service.
//!
//! The retrieval core lives in `docqa-rag`; this crate wires it to an
//! axum router and a process entry point.

pub mod server;
pub mod types;

pub use server::{AppState, ServerConfig, app_router, run_server};
