use std::fmt;

use thiserror::Error;

/// Code reported for errors that do not carry one of their own.
pub const DEFAULT_ERROR_CODE: u32 = 500000;

/// The four outcomes a failed request can surface as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BadRequest => write!(f, "bad request"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Conflict => write!(f, "conflict"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Errors raised by validation, lookup, locking and persistence.
///
/// Every variant carries the user-facing message and, optionally, a
/// numeric code. Use the constructors below rather than building variants
/// by hand so the codes stay consistent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarkError {
    #[error("{message}")]
    BadRequest { message: String, code: Option<u32> },

    #[error("{message}")]
    NotFound { message: String, code: Option<u32> },

    #[error("{message}")]
    Conflict { message: String, code: Option<u32> },

    #[error("{message}")]
    Internal { message: String, code: Option<u32> },
}

impl HarkError {
    /// The request body could not be decoded.
    pub fn entity_decode(err: impl fmt::Display) -> Self {
        HarkError::BadRequest {
            message: format!("Could not decode request entity: {:?}", err.to_string()),
            code: Some(400001),
        }
    }

    /// A decoded entity failed its own validation.
    pub fn entity_invalid(msg: impl fmt::Display) -> Self {
        HarkError::BadRequest {
            message: format!("Request entity invalid: {:?}", msg.to_string()),
            code: Some(400002),
        }
    }

    pub fn machine_not_found(machine_id: &str) -> Self {
        HarkError::NotFound {
            message: format!("Machine not found: {:?}", machine_id),
            code: Some(404001),
        }
    }

    pub fn entity_conflict(msg: impl Into<String>) -> Self {
        HarkError::Conflict {
            message: msg.into(),
            code: Some(409001),
        }
    }

    /// Failed to serialize or deserialize `what`.
    pub fn serialization(what: &str, err: impl fmt::Display) -> Self {
        HarkError::Internal {
            message: format!("Failed {}: {:?}", what, err.to_string()),
            code: Some(500001),
        }
    }

    pub fn state_persist(err: impl fmt::Display) -> Self {
        HarkError::Internal {
            message: format!("failed to persist state: {}", err),
            code: Some(500002),
        }
    }

    pub fn state_lock(err: impl fmt::Display) -> Self {
        HarkError::Internal {
            message: format!("failed to lock state for writing: {}", err),
            code: Some(500003),
        }
    }

    /// An internal failure with no dedicated code.
    pub fn internal(msg: impl Into<String>) -> Self {
        HarkError::Internal {
            message: msg.into(),
            code: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HarkError::BadRequest { .. } => ErrorKind::BadRequest,
            HarkError::NotFound { .. } => ErrorKind::NotFound,
            HarkError::Conflict { .. } => ErrorKind::Conflict,
            HarkError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            HarkError::BadRequest { message, .. }
            | HarkError::NotFound { message, .. }
            | HarkError::Conflict { message, .. }
            | HarkError::Internal { message, .. } => message,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            HarkError::BadRequest { code, .. }
            | HarkError::NotFound { code, .. }
            | HarkError::Conflict { code, .. }
            | HarkError::Internal { code, .. } => *code,
        }
    }

    /// The code to report on the wire, falling back to [`DEFAULT_ERROR_CODE`].
    pub fn code_or_default(&self) -> u32 {
        self.code().unwrap_or(DEFAULT_ERROR_CODE)
    }
}
