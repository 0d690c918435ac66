//! Error types for the bootstrap.
//!
//! None of these reach the page UI. [`LoadError`] is reported to a diagnostic
//! sink and the page carries on without a renderer; [`MissingSurfaceError`]
//! stops surface sizing for the rest of the page's life.

/// The rendering module could not be loaded or initialized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The module fetch or import was rejected by the host.
    #[error("failed to fetch module {locator}: {reason}")]
    Fetch { locator: String, reason: String },

    /// The module was fetched but its init export threw or rejected.
    #[error("failed to initialize module {locator}: {reason}")]
    Init { locator: String, reason: String },

    /// A load was already attempted for this loader.
    #[error("module {locator} was already requested")]
    AlreadyAttempted { locator: String },
}

impl LoadError {
    /// The locator the failed load was for.
    #[must_use]
    pub fn locator(&self) -> &str {
        match self {
            Self::Fetch { locator, .. } | Self::Init { locator, .. } | Self::AlreadyAttempted { locator } => locator,
        }
    }
}

/// The drawing surface was not present at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("drawing surface #{id} not found")]
pub struct MissingSurfaceError {
    pub id: String,
}

/// A build-time configuration value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid height defer delay {0:?}: expected milliseconds")]
    InvalidDelay(String),

    #[error("invalid log level {0:?}")]
    InvalidLogLevel(String),
}
