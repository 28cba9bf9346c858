//! Session state types

use crate::contract::{ClassificationResult, FeedbackDraft, InputDraft};
use serde::Serialize;

/// Where the session is with respect to classification
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    /// No result on screen
    #[default]
    Idle,

    /// Classify request in flight
    Classifying {
        /// Token the completion must echo
        generation: u64,
        /// Trimmed text captured when the request was sent
        original_text: String,
    },

    /// A result is on screen with its editable feedback draft
    Classified {
        result: ClassificationResult,
        feedback: FeedbackDraft,
    },
}

/// Everything the session knows. Owned by the runtime; readers get snapshots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub input: InputDraft,
    pub phase: Phase,
    /// Last classify failure (the error overlay)
    pub error: Option<String>,
    /// Progress/outcome of the latest feedback or retrain call. Last write wins.
    pub feedback_status: Option<String>,
    /// Bumped on every classify start and every restart
    pub generation: u64,
    /// Bumped on every restart
    pub epoch: u64,
    /// Feedback calls sent for the result on screen. A fresh classify zeroes
    /// this; calls for the replaced result still write `feedback_status`.
    pub feedback_in_flight: u32,
    /// Retrain calls sent for the result on screen, same rules
    pub retrain_in_flight: u32,
}

/// Coarse status for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Empty,
    Editing,
    Classifying,
    Classified,
    SubmittingFeedback,
    Retraining,
    Error,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session that keeps counters moving so older tokens never match again
    pub fn restarted(&self) -> Self {
        Self {
            generation: self.generation + 1,
            epoch: self.epoch + 1,
            ..Self::default()
        }
    }

    pub fn is_classifying(&self) -> bool {
        matches!(self.phase, Phase::Classifying { .. })
    }

    pub fn result(&self) -> Option<&ClassificationResult> {
        match &self.phase {
            Phase::Classified { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn feedback(&self) -> Option<&FeedbackDraft> {
        match &self.phase {
            Phase::Classified { feedback, .. } => Some(feedback),
            _ => None,
        }
    }

    pub fn can_classify(&self) -> bool {
        !self.is_classifying() && self.input.is_classifiable()
    }

    pub fn can_restart(&self) -> bool {
        !self.is_classifying()
    }

    pub fn status(&self) -> SessionStatus {
        match &self.phase {
            Phase::Classifying { .. } => SessionStatus::Classifying,
            Phase::Classified { .. } if self.feedback_in_flight > 0 => {
                SessionStatus::SubmittingFeedback
            }
            Phase::Classified { .. } if self.retrain_in_flight > 0 => SessionStatus::Retraining,
            Phase::Classified { .. } => SessionStatus::Classified,
            Phase::Idle if self.error.is_some() => SessionStatus::Error,
            Phase::Idle if self.input.is_blank() => SessionStatus::Empty,
            Phase::Idle => SessionStatus::Editing,
        }
    }
}
