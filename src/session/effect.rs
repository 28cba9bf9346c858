//! Effects produced by state transitions

use crate::contract::{FeedbackDraft, InputDraft};

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call `classify` with the draft as it was when the intent arrived
    Classify { generation: u64, input: InputDraft },

    /// Call `submit_feedback`
    SubmitFeedback {
        epoch: u64,
        generation: u64,
        draft: FeedbackDraft,
    },

    /// Call `retrain`
    Retrain { epoch: u64, generation: u64 },

    /// Publish the new state to readers
    PublishState,
}

impl Effect {
    /// Whether this effect makes a backend round trip
    pub fn is_backend_call(&self) -> bool {
        !matches!(self, Effect::PublishState)
    }
}
