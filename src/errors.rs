use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Structurally invalid input (inverted range, zero bin step, negative amount).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Range spans {span} bins, exceeding the protocol limit of {limit} bins per position")]
    RangeTooWide { span: u32, limit: u32 },

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Failure reported by an external collaborator (RPC node, price API).
    #[error("External call failed ({source_name}): {message}")]
    External {
        source_name: &'static str,
        message: String,
    },

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Parse float error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl AdvisorError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn external(source_name: &'static str, msg: impl Into<String>) -> Self {
        Self::External {
            source_name,
            message: msg.into(),
        }
    }
}
