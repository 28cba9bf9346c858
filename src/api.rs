//! HTTP API for the email session
//!
//! Intents come in as small POSTs and are forwarded to the session runtime.
//! Readers poll the snapshot or follow the SSE stream.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::runtime::SessionHandle;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
    /// Largest accepted `/api/session/file` body
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(session: SessionHandle, max_upload_bytes: usize) -> Self {
        Self {
            session,
            max_upload_bytes,
        }
    }
}
