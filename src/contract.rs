//! Request contract with the classification backend
//!
//! Three operations, each a single round trip. None of them is safe to
//! repeat, so nothing here retries.

mod error;
mod http;
pub mod types;

pub use error::ContractError;
pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Operations the classification backend exposes
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    /// Classify the drafted email. Fails validation locally when the draft is empty.
    async fn classify(&self, input: &InputDraft) -> Result<ClassificationResult, ContractError>;

    /// Submit a correction. Callers check the draft is submittable first.
    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<Ack, ContractError>;

    /// Ask the backend to fold accumulated feedback into its model
    async fn retrain(&self) -> Result<RetrainOutcome, ContractError>;
}

#[async_trait]
impl<T: ClassifierBackend + ?Sized> ClassifierBackend for Arc<T> {
    async fn classify(&self, input: &InputDraft) -> Result<ClassificationResult, ContractError> {
        (**self).classify(input).await
    }

    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<Ack, ContractError> {
        (**self).submit_feedback(draft).await
    }

    async fn retrain(&self) -> Result<RetrainOutcome, ContractError> {
        (**self).retrain().await
    }
}

/// Logging wrapper for backends
pub struct LoggingBackend<B> {
    inner: B,
}

impl<B: ClassifierBackend> LoggingBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: &'static str, start: Instant, result: &Result<T, ContractError>) {
    let duration_ms = start.elapsed().as_millis();
    match result {
        Ok(_) => {
            tracing::info!(operation, duration_ms = %duration_ms, "Backend call completed");
        }
        Err(e) if e.is_fault() => {
            tracing::error!(
                operation,
                duration_ms = %duration_ms,
                kind = e.kind(),
                error = %e,
                "Backend call failed"
            );
        }
        Err(e) => {
            tracing::info!(
                operation,
                duration_ms = %duration_ms,
                kind = e.kind(),
                error = %e,
                "Backend call declined"
            );
        }
    }
}

#[async_trait]
impl<B: ClassifierBackend> ClassifierBackend for LoggingBackend<B> {
    async fn classify(&self, input: &InputDraft) -> Result<ClassificationResult, ContractError> {
        let start = Instant::now();
        let result = self.inner.classify(input).await;
        if let Ok(r) = &result {
            tracing::debug!(
                category = %r.category,
                confidence = r.confidence,
                signals = r.signals.len(),
                "Classification received"
            );
        }
        log_outcome("classify", start, &result);
        result
    }

    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<Ack, ContractError> {
        let start = Instant::now();
        let result = self.inner.submit_feedback(draft).await;
        log_outcome("submit_feedback", start, &result);
        result
    }

    async fn retrain(&self) -> Result<RetrainOutcome, ContractError> {
        let start = Instant::now();
        let result = self.inner.retrain().await;
        log_outcome("retrain", start, &result);
        result
    }
}
