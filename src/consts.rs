//! Shared defaults for the bootstrap crate.

// ── Module loading ──────────────────────────────────────────────

/// Locator of the rendering module. Relative locators resolve against the
/// page's base URI.
pub const DEFAULT_MODULE_LOCATOR: &str = "./pkg/renderer.js";

/// Export name of the wasm-bindgen init function on the loaded module.
pub const MODULE_INIT_EXPORT: &str = "default";

// ── Surface sizing ──────────────────────────────────────────────

/// DOM id of the drawing surface.
pub const DEFAULT_SURFACE_ID: &str = "canvas";

/// Delay before the deferred height write, in milliseconds. Zero means
/// "next turn of the event loop".
pub const DEFAULT_HEIGHT_DEFER_MS: u32 = 0;

// ── Logging ─────────────────────────────────────────────────────

/// Console log level when none is configured.
pub const DEFAULT_LOG_LEVEL: log::Level = log::Level::Info;
