//! Error types for sqlspy.
//!
//! Two families live here:
//!
//! - [`SqlError`] is the failure type of the driver contract in [`crate::api`].
//!   Real drivers produce it, and the spy layer hands it back to the caller
//!   untouched after reporting it.
//! - [`SpyError`] covers the proxy's own glue: configuration and logging setup.

use thiserror::Error;

use crate::api::Capability;

/// Failure raised by a database driver, or by the capability contract itself.
///
/// Follows the canonical error struct pattern: classification is exposed
/// through `is_xxx()` predicates, the kind enum stays private.
///
/// # Example
///
/// ```rust,ignore
/// use sqlspy::SqlError;
///
/// let err = SqlError::database("unique constraint violated")
///     .with_sql_state("23000")
///     .with_vendor_code(1);
/// assert!(err.is_database());
/// assert_eq!(err.sql_state(), Some("23000"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct SqlError {
    kind: ErrorKind,
    sql_state: Option<String>,
    vendor_code: Option<i32>,
}

/// Internal error classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    /// Error reported by the database or the driver talking to it.
    #[error("{message}")]
    Database { message: String },

    /// The driver does not implement an optional capability.
    #[error("feature not supported: {feature}")]
    FeatureNotSupported { feature: String },

    /// `unwrap_for` was asked for a capability the handle does not wrap.
    #[error("not a wrapper for {capability}")]
    NotAWrapper { capability: String },

    /// No driver produced a connection for the URL.
    #[error("invalid or unknown driver url: {url}")]
    InvalidUrl { url: String },
}

impl SqlError {
    /// Create an error reported by the database.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Database {
            message: message.into(),
        })
    }

    /// Create an error for an unimplemented optional capability.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::FeatureNotSupported {
            feature: feature.into(),
        })
    }

    /// Create an error for a failed capability unwrap.
    #[must_use]
    pub fn not_a_wrapper(capability: &Capability) -> Self {
        Self::from_kind(ErrorKind::NotAWrapper {
            capability: capability.to_string(),
        })
    }

    /// Create an error for a URL that no driver could open.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::InvalidUrl { url: url.into() })
    }

    const fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            sql_state: None,
            vendor_code: None,
        }
    }

    /// Attach a five character SQLSTATE code.
    #[must_use]
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Attach a vendor specific error code.
    #[must_use]
    pub const fn with_vendor_code(mut self, code: i32) -> Self {
        self.vendor_code = Some(code);
        self
    }

    #[must_use]
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    #[must_use]
    pub const fn vendor_code(&self) -> Option<i32> {
        self.vendor_code
    }

    #[must_use]
    pub const fn is_database(&self) -> bool {
        matches!(self.kind, ErrorKind::Database { .. })
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.kind, ErrorKind::FeatureNotSupported { .. })
    }

    #[must_use]
    pub const fn is_not_a_wrapper(&self) -> bool {
        matches!(self.kind, ErrorKind::NotAWrapper { .. })
    }

    #[must_use]
    pub const fn is_invalid_url(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidUrl { .. })
    }
}

/// Result of a call through the driver contract.
pub type SqlResult<T> = std::result::Result<T, SqlError>;

/// Errors of the proxy layer's own setup.
#[derive(Error, Debug)]
pub enum SpyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl SpyError {
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, SpyError>;
