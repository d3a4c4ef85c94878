use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatePassError {
    #[error("Validation error on '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Gate pass sequence {id} not found")]
    NotFoundError { id: i64 },

    #[error("Role '{role}' is not allowed to {operation}")]
    AuthorizationError { role: String, operation: String },

    #[error("Configuration error on '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Storage,
    Access,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl GatePassError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } | Self::NotFoundError { .. } => ErrorCategory::Input,
            Self::StorageError { .. } => ErrorCategory::Storage,
            Self::AuthorizationError { .. } => ErrorCategory::Access,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ValidationError { .. } | Self::NotFoundError { .. } => ErrorSeverity::High,
            // 儲存層忙碌或逾時，呼叫端可自行重試
            Self::StorageError { .. } => ErrorSeverity::Medium,
            Self::AuthorizationError { .. } | Self::ConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { field, message } => {
                format!("Invalid value for {}: {}", field, message)
            }
            Self::StorageError { .. } => {
                "Gate pass number could not be recorded; no number was issued".to_string()
            }
            Self::NotFoundError { id } => format!("No gate pass sequence with id {}", id),
            Self::AuthorizationError { operation, .. } => {
                format!("You do not have permission to {}", operation)
            }
            Self::ConfigError { field, message } => {
                format!("Configuration problem in {}: {}", field, message)
            }
            Self::IoError(e) => format!("File system error: {}", e),
            Self::SerializationError(e) => format!("Could not encode response: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Check the pass type (RGP/NRGP) and financial year (e.g. 2526)",
            Self::StorageError { .. } => "Check the database path and retry the request",
            Self::NotFoundError { .. } => "List the sequences to find a valid id",
            Self::AuthorizationError { .. } => "Ask an admin user to perform this operation",
            Self::ConfigError { .. } => "Fix the configuration file and try again",
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::SerializationError(_) => "Report this as a bug",
        }
    }
}

impl From<rusqlite::Error> for GatePassError {
    fn from(e: rusqlite::Error) -> Self {
        Self::storage(format!("SQLite error: {}", e))
    }
}

impl From<r2d2::Error> for GatePassError {
    fn from(e: r2d2::Error) -> Self {
        Self::storage(format!("Connection pool error: {}", e))
    }
}

impl From<tokio::task::JoinError> for GatePassError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::storage(format!("Storage task failed: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, GatePassError>;
