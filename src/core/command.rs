use async_trait::async_trait;
use crate::core::library::LibraryError;

#[derive(Debug, PartialEq)]
pub enum CommandError {
    UnavailableForCharge {
        message: String,
    },
    HoldExists {
        message: String,
    },
    NotCharged {
        message: String,
    },
    Conflict {
        message: String,
    },
    CatalogUnavailable {
        message: String,
        reason_code: Option<String>,
    },
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
}

impl CommandError {
    pub fn validation(message: &str) -> CommandError {
        CommandError::Validation { message: message.to_string(), reason_code: None }
    }

    pub fn retryable(&self) -> bool {
        match self {
            CommandError::Conflict { .. } => { true }
            CommandError::CatalogUnavailable { .. } => { true }
            CommandError::Database { retryable, .. } => { *retryable }
            CommandError::Runtime { retryable, .. } => { *retryable }
            _ => { false }
        }
    }
}

#[async_trait]
pub trait Command<Request, Response> {
    async fn execute(&self, req: Request) -> Result<Response, CommandError>;
}

impl From<LibraryError> for CommandError {
    fn from(other: LibraryError) -> Self {
        match other {
            LibraryError::Database { message, reason_code, retryable } => {
                CommandError::Database { message, reason_code, retryable }
            }
            LibraryError::NotFound { message } => {
                CommandError::NotFound { message }
            }
            LibraryError::VersionConflict { message } => {
                CommandError::Conflict { message }
            }
            LibraryError::UnavailableForCharge { message } => {
                CommandError::UnavailableForCharge { message }
            }
            LibraryError::HoldExists { message } => {
                CommandError::HoldExists { message }
            }
            LibraryError::NotCharged { message } => {
                CommandError::NotCharged { message }
            }
            LibraryError::CatalogUnavailable { message, reason_code } => {
                CommandError::CatalogUnavailable { message, reason_code }
            }
            LibraryError::Validation { message, reason_code } => {
                CommandError::Validation { message, reason_code }
            }
            LibraryError::Serialization { message } => {
                CommandError::Serialization { message }
            }
            LibraryError::Runtime { message, reason_code } => {
                CommandError::Runtime { message, reason_code, retryable: false }
            }
        }
    }
}
