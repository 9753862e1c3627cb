use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    NotFound {
        message: String,
    },
    // The charge list was written by someone else between our read and our write.
    // Operations reload and retry on this error; it only escapes once the retry budget is spent.
    VersionConflict {
        message: String,
    },
    UnavailableForCharge {
        message: String,
    },
    HoldExists {
        message: String,
    },
    NotCharged {
        message: String,
    },
    // The eligible item service could not answer. Never treat this as "no items".
    CatalogUnavailable {
        message: String,
        reason_code: Option<String>,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn version_conflict(message: &str) -> LibraryError {
        LibraryError::VersionConflict { message: message.to_string() }
    }

    pub fn unavailable_for_charge(message: &str) -> LibraryError {
        LibraryError::UnavailableForCharge { message: message.to_string() }
    }

    pub fn hold_exists(message: &str) -> LibraryError {
        LibraryError::HoldExists { message: message.to_string() }
    }

    pub fn not_charged(message: &str) -> LibraryError {
        LibraryError::NotCharged { message: message.to_string() }
    }

    pub fn catalog_unavailable(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::CatalogUnavailable { message: message.to_string(), reason_code }
    }

    pub fn database_or_not_found(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if retryable {
            LibraryError::database(
                format!("ddb database unavailable error {:?} {:?}", message, reason).as_str(), reason, true)
        } else if let Some(ref reason_val) = reason {
            if reason_val.as_str().contains("404") {
                LibraryError::not_found(
                    format!("not found error {:?} {:?}", message, reason).as_str())
            } else {
                LibraryError::database(
                    format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
            }
        } else {
            LibraryError::database(
                format!("ddb database error {:?} {:?}", message, reason).as_str(), reason, false)
        }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } => { *retryable }
            LibraryError::NotFound { .. } => { false }
            LibraryError::VersionConflict { .. } => { true }
            LibraryError::UnavailableForCharge { .. } => { false }
            LibraryError::HoldExists { .. } => { false }
            LibraryError::NotCharged { .. } => { false }
            LibraryError::CatalogUnavailable { .. } => { true }
            LibraryError::Validation { .. } => { false }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { false }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, LibraryError::VersionConflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound { .. })
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(
            format!("serde parsing {:?}", err).as_str())
    }
}

impl From<config::ConfigError> for LibraryError {
    fn from(err: config::ConfigError) -> Self {
        LibraryError::validation(
            format!("invalid configuration {}", err).as_str(), None)
    }
}

impl From<reqwest::Error> for LibraryError {
    fn from(err: reqwest::Error) -> Self {
        let reason = err.status().map(|status| status.as_u16().to_string());
        LibraryError::catalog_unavailable(
            format!("catalog request failed {}", err).as_str(), reason)
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, retryable } => {
                write!(f, "{} {:?} {}", message, reason_code, retryable)
            }
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::VersionConflict { message } => {
                write!(f, "{}", message)
            }
            LibraryError::UnavailableForCharge { message } => {
                write!(f, "{}", message)
            }
            LibraryError::HoldExists { message } => {
                write!(f, "{}", message)
            }
            LibraryError::NotCharged { message } => {
                write!(f, "{}", message)
            }
            LibraryError::CatalogUnavailable { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Validation { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// A specialized Result type for the lending services.
pub type LibraryResult<T> = Result<T, LibraryError>;

// It defines abstraction for paginated result
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    // The page number or token
    pub page: Option<String>,
    // page size
    pub page_size: usize,
    // Next page if available
    pub next_page: Option<String>,
    // list of records
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn new(page: Option<&str>, page_size: usize,
               next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}
