use thiserror::Error;

/// Failure raised by a repository or collaborator. Decision and grant
/// operations never propagate it; they fold it into their `StorageError`
/// outcome variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
    #[error("write rejected: {message}")]
    WriteRejected { message: String },
    #[error("storage timeout during {operation}")]
    Timeout { operation: String },
}

impl StorageError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StorageError::Unavailable {
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        StorageError::WriteRejected {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config read failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse failed: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {message}")]
    Invalid { message: String },
}

/// Coarse classification of an operation outcome. Denial is `Unauthorized`
/// and no-op writes are `Conflict`; neither is a failure of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    NotFound,
    Unauthorized,
    Conflict,
    Rejected,
    Storage,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::Unauthorized => "unauthorized",
            OutcomeKind::Conflict => "conflict",
            OutcomeKind::Rejected => "rejected",
            OutcomeKind::Storage => "storage_error",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, OutcomeKind::Storage)
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
