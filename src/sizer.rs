//! Keeps the drawing surface's CSS size matched to the viewport.
//!
//! Width is written synchronously. Height is written from a deferred task
//! that samples the viewport when it runs, because some layout engines still
//! report a stale height while the resize notification is being dispatched.
//!
//! Overlapping deferred writes are neither cancelled nor coalesced. Under a
//! burst of resizes several height writes can be pending at once; they run in
//! scheduler order and each samples the viewport at run time, so the last one
//! to run leaves the settled height.
//!
//! Hosts do not agree on whether a resize fires on page load, so
//! [`SurfaceSizer::install`] both registers the handler and runs it once.

use std::rc::Rc;

use serde::Serialize;

use crate::consts::DEFAULT_HEIGHT_DEFER_MS;

#[cfg(test)]
#[path = "sizer_test.rs"]
mod sizer_test;

/// Current viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// The externally-owned element whose dimensions are kept in sync.
pub trait Surface {
    fn set_width(&self, px: f64);
    fn set_height(&self, px: f64);
}

/// Read-only access to the host viewport.
///
/// Each axis is sampled independently. `None` means the host could not report
/// the value right now; the corresponding write is skipped.
pub trait Viewport {
    fn width(&self) -> Option<f64>;
    fn height(&self) -> Option<f64>;

    fn size(&self) -> Option<ViewportSize> {
        Some(ViewportSize { width: self.width()?, height: self.height()? })
    }
}

/// Runs a task on a later turn of the host event loop.
pub trait Scheduler {
    fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>);
}

/// Registration point for the host's viewport-resize notification.
///
/// Setting a handler replaces the previous one; at most one is active.
pub trait ResizeEvents {
    fn set_handler(&self, handler: Box<dyn FnMut()>);
}

pub struct SurfaceSizer {
    surface: Rc<dyn Surface>,
    viewport: Rc<dyn Viewport>,
    scheduler: Rc<dyn Scheduler>,
    height_delay_ms: u32,
}

impl SurfaceSizer {
    /// Create a sizer that defers height writes by the default delay.
    #[must_use]
    pub fn new(surface: Rc<dyn Surface>, viewport: Rc<dyn Viewport>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self { surface, viewport, scheduler, height_delay_ms: DEFAULT_HEIGHT_DEFER_MS }
    }

    /// Override the delay used for deferred height writes.
    #[must_use]
    pub fn with_height_delay(mut self, delay_ms: u32) -> Self {
        self.height_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn height_delay_ms(&self) -> u32 {
        self.height_delay_ms
    }

    /// Current viewport, if the host can report both axes.
    #[must_use]
    pub fn viewport_size(&self) -> Option<ViewportSize> {
        self.viewport.size()
    }

    /// Copy the current viewport width onto the surface.
    pub fn apply_width(&self) {
        match self.viewport.width() {
            Some(width) => self.surface.set_width(width),
            None => log::warn!("viewport width unavailable; skipping width write"),
        }
    }

    /// Schedule a height write that samples the viewport when it runs.
    pub fn apply_height_deferred(&self) {
        let surface = Rc::clone(&self.surface);
        let viewport = Rc::clone(&self.viewport);
        self.scheduler.defer(
            self.height_delay_ms,
            Box::new(move || match viewport.height() {
                Some(height) => surface.set_height(height),
                None => log::warn!("viewport height unavailable; skipping height write"),
            }),
        );
    }

    /// Width now, height on a later turn.
    pub fn sync_all(&self) {
        self.apply_width();
        self.apply_height_deferred();
    }

    /// Register [`Self::sync_all`] as the resize handler and run it once.
    pub fn install(self: &Rc<Self>, events: &dyn ResizeEvents) {
        let sizer = Rc::clone(self);
        events.set_handler(Box::new(move || sizer.sync_all()));
        log::debug!("resize handler installed");

        self.sync_all();
    }
}
