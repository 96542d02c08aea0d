//! Unified error model for the series store.
//! One enum is used across the whole public surface so that callers can match
//! on failure kinds (missing record, denied access, corrupt policy, bad
//! argument, storage fault) without inspecting message text.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeriesError {
    /// No live record matches the requested key.
    NotFound { code: String, message: String },
    /// The caller lacks the required action on the record's ACL, or lacks
    /// the admin role required for the administrative read path.
    Unauthorized { code: String, message: String },
    /// The access control text stored on a record could not be parsed.
    AclParse { code: String, message: String },
    /// A caller-supplied parameter violates a precondition.
    InvalidArgument { code: String, message: String },
    /// Wraps any underlying persistence or codec failure.
    Storage { code: String, message: String },
}

impl SeriesError {
    pub fn code_str(&self) -> &str {
        match self {
            SeriesError::NotFound { code, .. }
            | SeriesError::Unauthorized { code, .. }
            | SeriesError::AclParse { code, .. }
            | SeriesError::InvalidArgument { code, .. }
            | SeriesError::Storage { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            SeriesError::NotFound { message, .. }
            | SeriesError::Unauthorized { message, .. }
            | SeriesError::AclParse { message, .. }
            | SeriesError::InvalidArgument { message, .. }
            | SeriesError::Storage { message, .. } => message.as_str(),
        }
    }

    pub fn not_found<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        SeriesError::NotFound { code: code.into(), message: msg.into() }
    }
    pub fn unauthorized<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        SeriesError::Unauthorized { code: code.into(), message: msg.into() }
    }
    pub fn acl_parse<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        SeriesError::AclParse { code: code.into(), message: msg.into() }
    }
    pub fn invalid<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        SeriesError::InvalidArgument { code: code.into(), message: msg.into() }
    }
    pub fn storage<C: Into<String>, M: Into<String>>(code: C, msg: M) -> Self {
        SeriesError::Storage { code: code.into(), message: msg.into() }
    }

    /// Stable kind label, independent of the per-site code string.
    pub fn kind(&self) -> &'static str {
        match self {
            SeriesError::NotFound { .. } => "not_found",
            SeriesError::Unauthorized { .. } => "unauthorized",
            SeriesError::AclParse { .. } => "acl_parse",
            SeriesError::InvalidArgument { .. } => "invalid_argument",
            SeriesError::Storage { .. } => "storage",
        }
    }

    /// Business-rule failures are raised without logging and never retried.
    /// Infrastructure failures (corrupt ACL text, storage faults) are logged
    /// with context at the failure site before propagating.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            SeriesError::NotFound { .. }
                | SeriesError::Unauthorized { .. }
                | SeriesError::InvalidArgument { .. }
        )
    }
}

impl Display for SeriesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for SeriesError {}

pub type SeriesResult<T> = Result<T, SeriesError>;

impl From<anyhow::Error> for SeriesError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: anything bubbling up via anyhow is a storage fault
        SeriesError::Storage { code: "storage".into(), message: err.to_string() }
    }
}
