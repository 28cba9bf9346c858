//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to replace the draft with pasted text
#[derive(Debug, Deserialize)]
pub struct SetTextRequest {
    pub text: String,
}

/// Edits to the feedback draft. Absent fields are left alone; an empty
/// `corrected_category` means "keep predicted".
#[derive(Debug, Default, Deserialize)]
pub struct CorrectionRequest {
    #[serde(default)]
    pub corrected_category: Option<String>,
    #[serde(default)]
    pub improved_reply: Option<String>,
}

/// Response for intents the runtime committed
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
