#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write collection file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read collection file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to replace collection file: {0}")]
    FileReplace(std::io::Error),
    #[error("failed to serialize collection: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize collection: {0}")]
    Deserialization(serde_json::Error),
    #[error("store lock poisoned")]
    LockPoisoned,
}

impl PatientError {
    /// True for errors caused by the caller rather than by storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PatientError::InvalidInput(_) | PatientError::NotFound(_) | PatientError::Unauthorized(_)
        )
    }
}

impl From<citycare_types::TextError> for PatientError {
    fn from(e: citycare_types::TextError) -> Self {
        PatientError::InvalidInput(e.to_string())
    }
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
