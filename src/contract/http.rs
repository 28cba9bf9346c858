//! HTTP implementation of the backend contract

use super::types::{Ack, ClassificationResult, ClassifyPayload, FeedbackDraft, RetrainOutcome};
use super::types::{Category, InputDraft, SuggestedAction};
use super::{ClassifierBackend, ContractError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const PROCESS_PATH: &str = "/api/process";
pub const FEEDBACK_PATH: &str = "/api/feedback";
pub const RETRAIN_PATH: &str = "/api/retrain";

const FEEDBACK_FALLBACK_MESSAGE: &str = "Erro desconhecido ao enviar feedback";

/// Talks to the classification backend over multipart/JSON
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ContractError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST and return status plus raw body
    async fn post(&self, path: &str, form: Option<Form>) -> Result<(u16, String), ContractError> {
        let mut request = self.client.post(self.endpoint(path));
        if let Some(form) = form {
            request = request.multipart(form);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl ClassifierBackend for HttpBackend {
    async fn classify(&self, input: &InputDraft) -> Result<ClassificationResult, ContractError> {
        let payload = input.to_payload()?;
        let form = classify_form(payload)?;
        let (status, body) = self.post(PROCESS_PATH, Some(form)).await?;
        interpret_classify(status, &body)
    }

    async fn submit_feedback(&self, draft: &FeedbackDraft) -> Result<Ack, ContractError> {
        let form = draft
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        let (status, body) = self.post(FEEDBACK_PATH, Some(form)).await?;
        interpret_feedback(status, &body)
    }

    async fn retrain(&self) -> Result<RetrainOutcome, ContractError> {
        let (status, body) = self.post(RETRAIN_PATH, None).await?;
        interpret_retrain(status, &body)
    }
}

fn classify_form(payload: ClassifyPayload) -> Result<Form, ContractError> {
    match payload {
        ClassifyPayload::Text(text) => Ok(Form::new().text("text", text)),
        ClassifyPayload::File(file) => {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.name.clone())
                .mime_str(file.mime_type())?;
            Ok(Form::new().part("file", part))
        }
    }
}

// ============================================================================
// Response interpretation
// ============================================================================

/// Wire shape of `/api/process`. Every field is optional; absent means empty.
///
/// `signals` and `actions` come from the model unchecked, so they are read
/// as raw JSON and reduced to labels instead of failing the whole response.
#[derive(Debug, Default, Deserialize)]
struct ProcessResponse {
    category: Option<String>,
    confidence: Option<f64>,
    signals: Option<Value>,
    actions: Option<Value>,
    suggested_reply: Option<String>,
    error: Option<Value>,
}

impl ProcessResponse {
    fn into_result(self) -> ClassificationResult {
        ClassificationResult {
            category: self.category.map(Category::from).unwrap_or_default(),
            confidence: self.confidence.unwrap_or(0.0),
            signals: array_items(self.signals.as_ref())
                .filter_map(scalar_label)
                .collect(),
            actions: array_items(self.actions.as_ref())
                .filter_map(Value::as_object)
                .map(|action| {
                    let kind = action.get("type").and_then(scalar_label);
                    SuggestedAction::new(kind.unwrap_or_default())
                })
                .collect(),
            suggested_reply: self.suggested_reply.unwrap_or_default(),
        }
    }
}

/// Elements of a JSON array; anything else has none
fn array_items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Strings as-is, numbers and booleans in their JSON spelling. Null and
/// nested values carry no label.
fn scalar_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[derive(Debug, Default, Deserialize)]
struct FlagResponse {
    ok: Option<Value>,
    retrained: Option<Value>,
    error: Option<Value>,
}

pub(crate) fn interpret_classify(
    status: u16,
    body: &str,
) -> Result<ClassificationResult, ContractError> {
    if !(200..300).contains(&status) {
        return Err(ContractError::Http { status });
    }

    let response: ProcessResponse =
        serde_json::from_str(body).map_err(|e| ContractError::decode(e.to_string()))?;

    if let Some(message) = error_message(response.error.as_ref()) {
        return Err(ContractError::Server { message });
    }
    Ok(response.into_result())
}

pub(crate) fn interpret_feedback(status: u16, body: &str) -> Result<Ack, ContractError> {
    let response = parse_flags(status, body)?;
    if response.ok.as_ref().is_some_and(is_truthy) {
        return Ok(Ack);
    }
    let message = error_message(response.error.as_ref())
        .unwrap_or_else(|| FEEDBACK_FALLBACK_MESSAGE.to_string());
    Err(ContractError::Server { message })
}

pub(crate) fn interpret_retrain(status: u16, body: &str) -> Result<RetrainOutcome, ContractError> {
    let response = parse_flags(status, body)?;
    if let Some(message) = error_message(response.error.as_ref()) {
        return Err(ContractError::Server { message });
    }
    if response.retrained.as_ref().is_some_and(is_truthy) {
        Ok(RetrainOutcome)
    } else {
        Err(ContractError::NothingToTrain)
    }
}

/// The backend reports feedback/retrain failures as JSON on any status,
/// so the body decides. A non-JSON body on a failing status is an HTTP error.
fn parse_flags(status: u16, body: &str) -> Result<FlagResponse, ContractError> {
    match serde_json::from_str::<FlagResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !(200..300).contains(&status) => Err(ContractError::Http { status }),
        Err(e) => Err(ContractError::decode(e.to_string())),
    }
}

/// Message carried by a truthy `error` field
fn error_message(error: Option<&Value>) -> Option<String> {
    let error = error.filter(|v| is_truthy(v))?;
    Some(match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
