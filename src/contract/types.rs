//! Payload and response types shared with the classification backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::ContractError;

/// Shown when classify is attempted with neither text nor file
pub const EMPTY_INPUT_MESSAGE: &str = "Por favor, cole o texto do e-mail ou envie um arquivo.";

/// Extensions the input layer accepts for uploads
pub const ACCEPTED_EXTENSIONS: &[&str] = &["txt", "pdf"];

// ============================================================================
// Category
// ============================================================================

/// Predicted class of an email. Unknown labels are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Produtivo,
    Improdutivo,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Produtivo => "Produtivo",
            Category::Improdutivo => "Improdutivo",
            Category::Other(label) => label,
        }
    }

    /// Parse a correction value where an empty string means "keep predicted"
    pub fn parse_override(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self::from(value.to_string()))
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Other(String::new())
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Produtivo" => Category::Produtivo,
            "Improdutivo" => Category::Improdutivo,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Input Draft
// ============================================================================

/// An uploaded email file. Bytes are shared so state snapshots stay cheap.
#[derive(Clone, PartialEq, Eq)]
pub struct EmailFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl EmailFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("txt") => "text/plain",
            Some("pdf") => "application/pdf",
            Some("eml") => "message/rfc822",
            _ => "application/octet-stream",
        }
    }
}

impl fmt::Debug for EmailFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailFile")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Where the email to classify comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Text(String),
    File(EmailFile),
}

/// The email being edited. Holds at most one source; setting one replaces the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDraft {
    source: Option<InputSource>,
}

impl InputDraft {
    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut draft = Self::default();
        draft.set_text(text);
        draft
    }

    #[cfg(test)]
    pub fn from_file(file: EmailFile) -> Self {
        let mut draft = Self::default();
        draft.set_file(file);
        draft
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.source = Some(InputSource::Text(text.into()));
    }

    pub fn set_file(&mut self, file: EmailFile) {
        self.source = Some(InputSource::File(file));
    }

    pub fn source(&self) -> Option<&InputSource> {
        self.source.as_ref()
    }

    /// Raw text as typed; empty when a file is active
    pub fn text(&self) -> &str {
        match &self.source {
            Some(InputSource::Text(text)) => text,
            _ => "",
        }
    }

    pub fn file(&self) -> Option<&EmailFile> {
        match &self.source {
            Some(InputSource::File(file)) => Some(file),
            _ => None,
        }
    }

    /// Nothing typed and no file chosen
    pub fn is_blank(&self) -> bool {
        match &self.source {
            None => true,
            Some(InputSource::Text(text)) => text.is_empty(),
            Some(InputSource::File(_)) => false,
        }
    }

    /// Whether classify may be invoked (trimmed text or a file)
    pub fn is_classifiable(&self) -> bool {
        match &self.source {
            None => false,
            Some(InputSource::Text(text)) => !text.trim().is_empty(),
            Some(InputSource::File(_)) => true,
        }
    }

    /// Validate and convert into the payload sent to `/api/process`
    pub fn to_payload(&self) -> Result<ClassifyPayload, ContractError> {
        match &self.source {
            Some(InputSource::Text(text)) if !text.trim().is_empty() => {
                Ok(ClassifyPayload::Text(text.trim().to_string()))
            }
            Some(InputSource::File(file)) => Ok(ClassifyPayload::File(file.clone())),
            _ => Err(ContractError::Validation(EMPTY_INPUT_MESSAGE.to_string())),
        }
    }
}

/// Validated classify payload: exactly one multipart field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyPayload {
    Text(String),
    File(EmailFile),
}

impl ClassifyPayload {
    /// The text captured as `original_text` for later feedback. Empty for uploads.
    pub fn original_text(&self) -> &str {
        match self {
            ClassifyPayload::Text(text) => text,
            ClassifyPayload::File(_) => "",
        }
    }
}

// ============================================================================
// Classification Result
// ============================================================================

/// A follow-up operation suggested with a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedAction {
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl SuggestedAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }
}

/// Outcome of one classify call. Never mutated after it is received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub actions: Vec<SuggestedAction>,
    pub suggested_reply: String,
}

// ============================================================================
// Feedback
// ============================================================================

/// A correction tied to the classification it corrects
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackDraft {
    pub original_text: String,
    pub predicted_category: Category,
    /// `None` keeps the predicted category
    pub corrected_category: Option<Category>,
    pub improved_reply: String,
}

impl FeedbackDraft {
    /// Seed a draft from a fresh result
    pub fn seeded(original_text: impl Into<String>, result: &ClassificationResult) -> Self {
        Self {
            original_text: original_text.into(),
            predicted_category: result.category.clone(),
            corrected_category: None,
            improved_reply: result.suggested_reply.clone(),
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.original_text.is_empty()
    }

    /// Multipart fields for `/api/feedback`; empty optionals are left out
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("original_text", self.original_text.clone()),
            ("predicted", self.predicted_category.to_string()),
        ];
        if let Some(corrected) = self
            .corrected_category
            .as_ref()
            .filter(|c| !c.as_str().is_empty())
        {
            fields.push(("corrected", corrected.to_string()));
        }
        if !self.improved_reply.is_empty() {
            fields.push(("improved_reply", self.improved_reply.clone()));
        }
        fields
    }
}

/// Backend accepted the feedback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ack;

/// Backend retrained the model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrainOutcome;
