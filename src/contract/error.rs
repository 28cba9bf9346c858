//! Error taxonomy for backend operations

use thiserror::Error;

/// Why a backend operation did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// Local precondition failed; nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Transport succeeded but the status is not 2xx
    #[error("Erro HTTP: {status}")]
    Http { status: u16 },

    /// 2xx response whose body signals a logical failure
    #[error("{message}")]
    Server { message: String },

    /// Retrain was a no-op: no feedback accumulated since the last train
    #[error("Nada para treinar. Modelo não foi re-treinado.")]
    NothingToTrain,

    /// Connect, timeout or body read failure
    #[error("Falha de conexão: {message}")]
    Transport { message: String },

    /// Body could not be decoded
    #[error("Resposta inválida do servidor: {message}")]
    Decode { message: String },
}

impl ContractError {
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Stable label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Http { .. } => "http",
            Self::Server { .. } => "server",
            Self::NothingToTrain => "nothing_to_train",
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
        }
    }

    /// Whether the backend is at fault (as opposed to an expected outcome)
    pub fn is_fault(&self) -> bool {
        !matches!(self, Self::Validation(_) | Self::NothingToTrain)
    }
}

impl From<reqwest::Error> for ContractError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::transport(format!("tempo esgotado ({e})"))
        } else if e.is_decode() {
            Self::decode(e.to_string())
        } else {
            Self::transport(e.to_string())
        }
    }
}
