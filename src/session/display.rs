//! Read-only views of the session for renderers

use super::state::{SessionState, SessionStatus};
use crate::contract::{Category, ClassificationResult, FeedbackDraft, InputSource};
use serde::Serialize;

const NO_VALUE: &str = "-";
const NO_REPLY: &str = "Nenhuma resposta sugerida.";

/// Percentage with one decimal; zero or non-finite means "no value"
pub fn format_confidence(confidence: f64) -> String {
    if !confidence.is_finite() || confidence == 0.0 {
        return NO_VALUE.to_string();
    }
    format!("{:.1}%", confidence * 100.0)
}

/// Comma-joined labels, or "-" when there are none
pub fn format_labels<S: AsRef<str>>(labels: &[S]) -> String {
    let joined = labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        NO_VALUE.to_string()
    } else {
        joined
    }
}

/// Badge style for a category
pub fn category_badge(category: &Category) -> &'static str {
    match category {
        Category::Produtivo => "productive",
        Category::Improdutivo => "unproductive",
        Category::Other(_) => "default",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputView {
    Empty,
    Text { text: String },
    File { name: String, size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub category: String,
    pub badge: &'static str,
    pub confidence: f64,
    pub confidence_display: String,
    pub signals: Vec<String>,
    pub signals_display: String,
    pub actions: Vec<String>,
    pub actions_display: String,
    pub suggested_reply: String,
    pub suggested_reply_display: String,
}

impl ResultView {
    fn new(result: &ClassificationResult) -> Self {
        let actions: Vec<String> = result.actions.iter().map(|a| a.kind.clone()).collect();
        Self {
            category: result.category.to_string(),
            badge: category_badge(&result.category),
            confidence: result.confidence,
            confidence_display: format_confidence(result.confidence),
            signals: result.signals.clone(),
            signals_display: format_labels(&result.signals),
            actions_display: format_labels(&actions),
            actions,
            suggested_reply: result.suggested_reply.clone(),
            suggested_reply_display: if result.suggested_reply.is_empty() {
                NO_REPLY.to_string()
            } else {
                result.suggested_reply.clone()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackView {
    pub predicted_category: String,
    /// Empty string means "keep predicted"
    pub corrected_category: String,
    pub improved_reply: String,
}

impl FeedbackView {
    fn new(draft: &FeedbackDraft) -> Self {
        Self {
            predicted_category: draft.predicted_category.to_string(),
            corrected_category: draft
                .corrected_category
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            improved_reply: draft.improved_reply.clone(),
        }
    }
}

/// Everything a renderer needs, detached from the live state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub input: InputView,
    pub result: Option<ResultView>,
    pub feedback: Option<FeedbackView>,
    pub error: Option<String>,
    pub feedback_status: Option<String>,
    pub can_classify: bool,
    pub can_restart: bool,
}

impl SessionSnapshot {
    pub fn from_state(state: &SessionState) -> Self {
        let input = match state.input.source() {
            None => InputView::Empty,
            Some(InputSource::Text(text)) => InputView::Text { text: text.clone() },
            Some(InputSource::File(file)) => InputView::File {
                name: file.name.clone(),
                size: file.size(),
            },
        };

        Self {
            status: state.status(),
            input,
            result: state.result().map(ResultView::new),
            feedback: state.feedback().map(FeedbackView::new),
            error: state.error.clone(),
            feedback_status: state.feedback_status.clone(),
            can_classify: state.can_classify(),
            can_restart: state.can_restart(),
        }
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::from_state(&SessionState::default())
    }
}
