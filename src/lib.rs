//! Page bootstrap for a WebAssembly renderer.
//!
//! This crate is compiled to WebAssembly and runs first on the host page. It
//! does two unrelated things at start: it kicks off an asynchronous load of the
//! rendering module, and it keeps the drawing surface's CSS size matched to
//! the browser viewport. Neither waits on the other. The renderer itself is
//! opaque to this crate; once loaded it owns the surface's contents.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`loader`] | One-shot module load state machine and diagnostic sink |
//! | [`sizer`] | Viewport-to-surface size synchronization |
//! | [`boot`] | Composes loader and sizer against a [`boot::Host`] |
//! | [`config`] | Build-time configuration |
//! | [`error`] | Error types |
//! | [`consts`] | Default locator, surface id and timings |
//! | `web` | Browser host, JS exports (feature `web`) |

pub mod boot;
pub mod config;
pub mod consts;
pub mod error;
pub mod loader;
pub mod sizer;

#[cfg(feature = "web")]
pub mod web;

#[cfg(test)]
pub(crate) mod testing;
