//! Bootstrap configuration resolved at build time.
//!
//! The locator and surface id are fixed per build, not per page load. Values
//! come from `option_env!` when the crate is compiled and fall back to the
//! defaults in [`crate::consts`].

use serde::Serialize;

use crate::consts::{DEFAULT_HEIGHT_DEFER_MS, DEFAULT_LOG_LEVEL, DEFAULT_MODULE_LOCATOR, DEFAULT_SURFACE_ID};
use crate::error::ConfigError;

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootConfig {
    /// Locator handed to the module loader.
    pub module_locator: String,
    /// DOM id of the drawing surface.
    pub surface_id: String,
    /// Delay for the deferred height write.
    pub height_defer_ms: u32,
    pub log_level: log::Level,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            module_locator: DEFAULT_MODULE_LOCATOR.to_owned(),
            surface_id: DEFAULT_SURFACE_ID.to_owned(),
            height_defer_ms: DEFAULT_HEIGHT_DEFER_MS,
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

/// Raw override values, one per configurable field. Blank values count as unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides<'a> {
    pub module_locator: Option<&'a str>,
    pub surface_id: Option<&'a str>,
    pub height_defer_ms: Option<&'a str>,
    pub log_level: Option<&'a str>,
}

impl BootConfig {
    /// Build config from environment variables captured at compile time.
    ///
    /// Optional:
    /// - `SURFACE_BOOT_MODULE_LOCATOR`: default `./pkg/renderer.js`
    /// - `SURFACE_BOOT_SURFACE_ID`: default `canvas`
    /// - `SURFACE_BOOT_HEIGHT_DEFER_MS`: default 0
    /// - `SURFACE_BOOT_LOG_LEVEL`: default `info`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric or level value does not parse.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        Self::from_overrides(&Overrides {
            module_locator: option_env!("SURFACE_BOOT_MODULE_LOCATOR"),
            surface_id: option_env!("SURFACE_BOOT_SURFACE_ID"),
            height_defer_ms: option_env!("SURFACE_BOOT_HEIGHT_DEFER_MS"),
            log_level: option_env!("SURFACE_BOOT_LOG_LEVEL"),
        })
    }

    /// Apply overrides on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric or level value does not parse.
    pub fn from_overrides(overrides: &Overrides<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let module_locator = non_blank(overrides.module_locator).map_or(defaults.module_locator, str::to_owned);
        let surface_id = non_blank(overrides.surface_id).map_or(defaults.surface_id, str::to_owned);
        let height_defer_ms = match non_blank(overrides.height_defer_ms) {
            Some(raw) => parse_delay(raw)?,
            None => defaults.height_defer_ms,
        };
        let log_level = match non_blank(overrides.log_level) {
            Some(raw) => parse_log_level(raw)?,
            None => defaults.log_level,
        };

        Ok(Self { module_locator, surface_id, height_defer_ms, log_level })
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_delay(raw: &str) -> Result<u32, ConfigError> {
    raw.parse::<u32>()
        .map_err(|_| ConfigError::InvalidDelay(raw.to_owned()))
}

fn parse_log_level(raw: &str) -> Result<log::Level, ConfigError> {
    raw.parse::<log::Level>()
        .map_err(|_| ConfigError::InvalidLogLevel(raw.to_owned()))
}
