//! Events that drive the session

use crate::contract::{Ack, Category, ClassificationResult, ContractError, EmailFile, RetrainOutcome};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User intents
    SetText {
        text: String,
    },
    SetFile {
        file: EmailFile,
    },
    Classify,
    EditCorrection(CorrectionEdit),
    SendFeedback,
    Retrain,
    Restart,

    // Backend completions
    ClassifyCompleted {
        generation: u64,
        outcome: Result<ClassificationResult, ContractError>,
    },
    FeedbackCompleted {
        epoch: u64,
        /// Generation of the result the feedback was sent for
        generation: u64,
        outcome: Result<Ack, ContractError>,
    },
    RetrainCompleted {
        epoch: u64,
        generation: u64,
        outcome: Result<RetrainOutcome, ContractError>,
    },
}

impl Event {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::SetText { .. } => "set_text",
            Event::SetFile { .. } => "set_file",
            Event::Classify => "classify",
            Event::EditCorrection(_) => "edit_correction",
            Event::SendFeedback => "send_feedback",
            Event::Retrain => "retrain",
            Event::Restart => "restart",
            Event::ClassifyCompleted { .. } => "classify_completed",
            Event::FeedbackCompleted { .. } => "feedback_completed",
            Event::RetrainCompleted { .. } => "retrain_completed",
        }
    }

    /// Whether this came from the user rather than the backend
    pub fn is_intent(&self) -> bool {
        !matches!(
            self,
            Event::ClassifyCompleted { .. }
                | Event::FeedbackCompleted { .. }
                | Event::RetrainCompleted { .. }
        )
    }
}

/// Feedback draft fields to overwrite in one step. Unset fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionEdit {
    /// `Some(None)` goes back to the predicted category
    pub category: Option<Option<Category>>,
    pub reply: Option<String>,
}

impl CorrectionEdit {
    #[cfg(test)]
    pub fn category(category: Option<Category>) -> Self {
        Self {
            category: Some(category),
            reply: None,
        }
    }

    #[cfg(test)]
    pub fn reply(reply: impl Into<String>) -> Self {
        Self {
            category: None,
            reply: Some(reply.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.reply.is_none()
    }
}
