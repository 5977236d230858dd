use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("credential rejected by {provider}")]
    CredentialInvalid { provider: String },
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("stored state is corrupt: {0}")]
    StorageCorrupt(String),
}

/// Provider call failures. Callers see a single "generation failed" kind; the
/// variants only feed the command log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed provider envelope: {0}")]
    EnvelopeMalformed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no JSON object found in response")]
    NoJsonFound,
    #[error("response JSON could not be parsed: {0}")]
    ParseFailure(String),
    #[error("response JSON does not match the expected shape: {0}")]
    SchemaMismatch(String),
}

impl InfraError {
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::CredentialInvalid { provider } => {
                format!("Invalid {provider} API key. Please check and try again.")
            }
            Self::Generation(GenerationError::Network(_)) => {
                "Could not reach the AI provider. Please check your connection and try again."
                    .to_string()
            }
            Self::Generation(_) => "Failed to generate response. Please try again.".to_string(),
            Self::Extraction(_) => {
                "Received invalid response from AI service. Please try again.".to_string()
            }
            Self::StorageCorrupt(_) => "Saved data could not be read and was reset.".to_string(),
            Self::Io(_) | Self::Json(_) | Self::Sqlite(_) | Self::InvalidConfig(_) => {
                "Something went wrong while saving your data. Please try again.".to_string()
            }
        }
    }
}
