//! Pure state transition function
//!
//! Given the same state and event this always produces the same result and
//! performs no I/O. Backend calls are returned as effects for the runtime.

use super::state::Phase;
use super::{CorrectionEdit, Effect, Event, SessionState};
use crate::contract::{ContractError, EmailFile, FeedbackDraft};
use thiserror::Error;

pub const FEEDBACK_NEEDS_RESULT: &str = "Erro: Classifique um e-mail antes de enviar feedback.";
pub const FEEDBACK_SENDING: &str = "Enviando...";
pub const FEEDBACK_SAVED: &str = "Feedback salvo com sucesso!";
pub const RETRAIN_RUNNING: &str = "Re-treinando modelo...";
pub const RETRAIN_DONE: &str = "Modelo re-treinado com sucesso!";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// New state plus a publish
    fn published(state: SessionState) -> Self {
        Self::new(state).with_effect(Effect::PublishState)
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// The event changed nothing (e.g. a response from before a restart)
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Intents the current state refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Classificação em andamento, aguarde a resposta")]
    ClassifyInFlight,
    #[error("Nenhum e-mail classificado nesta sessão")]
    NoClassification,
    #[error("Formato não suportado: {name}. Envie um arquivo .txt ou .pdf.")]
    UnsupportedFile { name: String },
}

/// Message for the classify error overlay
pub fn classify_failure_message(error: &ContractError) -> String {
    match error {
        ContractError::Http { status } => format!("Erro HTTP: {status} ao processar e-mail."),
        other => other.to_string(),
    }
}

/// Message for the feedback-status line after a failed feedback call
pub fn feedback_failure_message(error: &ContractError) -> String {
    format!("Erro: {error}")
}

pub fn transition(state: &SessionState, event: Event) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Input
        // ============================================================
        Event::SetText { text } => {
            let mut next = state.clone();
            next.input.set_text(text);
            Ok(TransitionResult::published(next))
        }

        Event::SetFile { file } => set_file(state, file),

        // ============================================================
        // Classification
        // ============================================================
        Event::Classify => classify(state),

        Event::ClassifyCompleted {
            generation,
            outcome,
        } => {
            let Phase::Classifying {
                generation: expected,
                original_text,
            } = &state.phase
            else {
                return Ok(TransitionResult::new(state.clone()));
            };
            if *expected != generation {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut next = state.clone();
            match outcome {
                Ok(result) => {
                    next.phase = Phase::Classified {
                        feedback: FeedbackDraft::seeded(original_text.clone(), &result),
                        result,
                    };
                }
                Err(e) => {
                    next.phase = Phase::Idle;
                    next.error = Some(classify_failure_message(&e));
                }
            }
            Ok(TransitionResult::published(next))
        }

        // ============================================================
        // Correction editing
        // ============================================================
        Event::EditCorrection(edit) => edit_feedback(state, edit),

        // ============================================================
        // Feedback and retrain
        // ============================================================
        Event::SendFeedback => {
            let mut next = state.clone();
            match &state.phase {
                Phase::Classified { feedback, .. } if feedback.is_submittable() => {
                    next.feedback_in_flight += 1;
                    next.feedback_status = Some(FEEDBACK_SENDING.to_string());
                    Ok(TransitionResult::published(next).with_effect(Effect::SubmitFeedback {
                        epoch: state.epoch,
                        generation: state.generation,
                        draft: feedback.clone(),
                    }))
                }
                _ => {
                    next.feedback_status = Some(FEEDBACK_NEEDS_RESULT.to_string());
                    Ok(TransitionResult::published(next))
                }
            }
        }

        Event::FeedbackCompleted {
            epoch,
            generation,
            outcome,
        } => {
            if epoch != state.epoch {
                return Ok(TransitionResult::new(state.clone()));
            }
            let mut next = state.clone();
            if generation == state.generation {
                next.feedback_in_flight = next.feedback_in_flight.saturating_sub(1);
            }
            next.feedback_status = Some(match outcome {
                Ok(_) => FEEDBACK_SAVED.to_string(),
                Err(e) => feedback_failure_message(&e),
            });
            Ok(TransitionResult::published(next))
        }

        Event::Retrain => {
            if state.result().is_none() {
                return Err(TransitionError::NoClassification);
            }
            let mut next = state.clone();
            next.retrain_in_flight += 1;
            next.feedback_status = Some(RETRAIN_RUNNING.to_string());
            Ok(TransitionResult::published(next).with_effect(Effect::Retrain {
                epoch: state.epoch,
                generation: state.generation,
            }))
        }

        Event::RetrainCompleted {
            epoch,
            generation,
            outcome,
        } => {
            if epoch != state.epoch {
                return Ok(TransitionResult::new(state.clone()));
            }
            let mut next = state.clone();
            if generation == state.generation {
                next.retrain_in_flight = next.retrain_in_flight.saturating_sub(1);
            }
            next.feedback_status = Some(match outcome {
                Ok(_) => RETRAIN_DONE.to_string(),
                Err(e) => e.to_string(),
            });
            Ok(TransitionResult::published(next))
        }

        // ============================================================
        // Restart
        // ============================================================
        Event::Restart => {
            if state.is_classifying() {
                return Err(TransitionError::ClassifyInFlight);
            }
            Ok(TransitionResult::published(state.restarted()))
        }
    }
}

fn set_file(state: &SessionState, file: EmailFile) -> Result<TransitionResult, TransitionError> {
    if !file.has_accepted_extension() {
        return Err(TransitionError::UnsupportedFile { name: file.name });
    }
    let mut next = state.clone();
    next.input.set_file(file);
    Ok(TransitionResult::published(next))
}

fn classify(state: &SessionState) -> Result<TransitionResult, TransitionError> {
    if state.is_classifying() {
        return Err(TransitionError::ClassifyInFlight);
    }

    // A new attempt always drops the previous result, error and draft
    let mut next = state.clone();
    next.phase = Phase::Idle;
    next.error = None;
    next.feedback_status = None;
    // Calls for the old result may still land, but no longer drive the status
    next.feedback_in_flight = 0;
    next.retrain_in_flight = 0;

    match state.input.to_payload() {
        Err(e) => {
            next.error = Some(classify_failure_message(&e));
            Ok(TransitionResult::published(next))
        }
        Ok(payload) => {
            next.generation = state.generation + 1;
            next.phase = Phase::Classifying {
                generation: next.generation,
                original_text: payload.original_text().to_string(),
            };
            let generation = next.generation;
            Ok(TransitionResult::published(next).with_effect(Effect::Classify {
                generation,
                input: state.input.clone(),
            }))
        }
    }
}

fn edit_feedback(
    state: &SessionState,
    edit: CorrectionEdit,
) -> Result<TransitionResult, TransitionError> {
    let mut next = state.clone();
    let Phase::Classified { feedback, .. } = &mut next.phase else {
        return Err(TransitionError::NoClassification);
    };
    if let Some(category) = edit.category {
        feedback.corrected_category = category;
    }
    if let Some(reply) = edit.reply {
        feedback.improved_reply = reply;
    }
    Ok(TransitionResult::published(next))
}
