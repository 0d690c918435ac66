//! One-shot asynchronous load of the rendering module.
//!
//! The loader moves `NotStarted → Pending → Loaded | Failed` exactly once.
//! Both end states are terminal: a failed load is reported to the
//! [`DiagnosticSink`] and never retried.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Serialize;
use url::Url;

use crate::error::LoadError;

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

/// Lifecycle of the rendering module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    NotStarted,
    Pending,
    Loaded,
    Failed,
}

impl LoadState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

/// Fetches and initializes a module by locator.
pub trait ModuleSource {
    fn fetch(&self, locator: &str) -> LocalBoxFuture<'static, Result<(), LoadError>>;
}

/// Resolve `locator` against the page's base URI.
///
/// A dynamic `import()` resolves relative specifiers against the importing
/// script, not the page, so the loader resolves them first. Absolute
/// locators pass through unchanged.
///
/// # Errors
///
/// Returns [`LoadError::Fetch`] when the base or the joined URL does not parse.
pub fn resolve_locator(locator: &str, base_uri: &str) -> Result<String, LoadError> {
    let invalid = |err: url::ParseError| LoadError::Fetch {
        locator: locator.to_owned(),
        reason: format!("cannot resolve against {base_uri}: {err}"),
    };
    let base = Url::parse(base_uri).map_err(invalid)?;
    let resolved = base.join(locator).map_err(invalid)?;
    Ok(resolved.into())
}

/// Write-only channel for load failures.
pub trait DiagnosticSink {
    fn report(&self, error: &LoadError);
}

/// Reports failures through the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, error: &LoadError) {
        log::error!("rendering module unavailable: {error}");
    }
}

pub struct ModuleLoader {
    locator: String,
    source: Box<dyn ModuleSource>,
    sink: Rc<dyn DiagnosticSink>,
    state: Cell<LoadState>,
}

impl ModuleLoader {
    #[must_use]
    pub fn new(locator: impl Into<String>, source: Box<dyn ModuleSource>, sink: Rc<dyn DiagnosticSink>) -> Self {
        Self { locator: locator.into(), source, sink, state: Cell::new(LoadState::NotStarted) }
    }

    #[must_use]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    /// Fetch and initialize the module.
    ///
    /// Only the first call does any work. Later calls return
    /// [`LoadError::AlreadyAttempted`] without touching the source, the sink
    /// or the state.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] from the source after reporting it to the
    /// sink, or [`LoadError::AlreadyAttempted`] on a repeat call.
    pub async fn load(&self) -> Result<(), LoadError> {
        if self.state.get() != LoadState::NotStarted {
            return Err(LoadError::AlreadyAttempted { locator: self.locator.clone() });
        }

        self.transition(LoadState::Pending);
        let outcome = self.source.fetch(&self.locator).await;

        match &outcome {
            Ok(()) => {
                self.transition(LoadState::Loaded);
                log::info!("rendering module loaded from {}", self.locator);
            }
            Err(err) => {
                self.transition(LoadState::Failed);
                self.sink.report(err);
            }
        }
        outcome
    }

    fn transition(&self, next: LoadState) {
        log::debug!("module {}: {:?} -> {next:?}", self.locator, self.state.get());
        self.state.set(next);
    }
}
