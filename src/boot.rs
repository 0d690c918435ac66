//! Startup composition.
//!
//! [`start`] wires a [`ModuleLoader`] and a [`SurfaceSizer`] against a
//! [`Host`] and starts both. They share nothing: the load runs as its own
//! task, and sizing works whether the load succeeds, fails or never settles.
//! A missing surface disables sizing but the load is already underway by
//! the time the surface is looked up.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Serialize;

use crate::config::BootConfig;
use crate::error::MissingSurfaceError;
use crate::loader::{DiagnosticSink, LoadState, ModuleLoader, ModuleSource};
use crate::sizer::{ResizeEvents, Scheduler, Surface, SurfaceSizer, Viewport, ViewportSize};

#[cfg(test)]
#[path = "boot_test.rs"]
mod boot_test;

/// Everything the bootstrap needs from its environment.
pub trait Host {
    /// Look up the drawing surface by id. Called once.
    fn find_surface(&self, id: &str) -> Option<Rc<dyn Surface>>;
    fn viewport(&self) -> Rc<dyn Viewport>;
    fn scheduler(&self) -> Rc<dyn Scheduler>;
    fn resize_events(&self) -> Rc<dyn ResizeEvents>;
    fn module_source(&self) -> Box<dyn ModuleSource>;
    fn diagnostics(&self) -> Rc<dyn DiagnosticSink>;
    /// Run a task on the host's local executor without waiting for it.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Handle to a started bootstrap. Holds the resize registration alive.
pub struct Boot {
    config: BootConfig,
    loader: Rc<ModuleLoader>,
    sizer: Result<Rc<SurfaceSizer>, MissingSurfaceError>,
    _resize: Rc<dyn ResizeEvents>,
}

/// Point-in-time view of the bootstrap for the host page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootStatus {
    pub config: BootConfig,
    pub module: LoadState,
    pub surface_attached: bool,
    /// Viewport as the sizer sees it now. `None` without a surface.
    pub viewport: Option<ViewportSize>,
}

/// Start the module load and surface sizing.
pub fn start(config: BootConfig, host: &dyn Host) -> Boot {
    let loader = Rc::new(ModuleLoader::new(config.module_locator.clone(), host.module_source(), host.diagnostics()));
    spawn_load(&loader, host);

    let resize = host.resize_events();
    let sizer = attach_sizer(&config, host).map(|sizer| {
        let sizer = Rc::new(sizer);
        sizer.install(resize.as_ref());
        sizer
    });
    if let Err(err) = &sizer {
        log::error!("{err}; surface sizing disabled");
    }

    Boot { config, loader, sizer, _resize: resize }
}

/// Look up the configured surface and build a sizer around it.
///
/// # Errors
///
/// Returns [`MissingSurfaceError`] when the host has no element with the
/// configured id.
pub fn attach_sizer(config: &BootConfig, host: &dyn Host) -> Result<SurfaceSizer, MissingSurfaceError> {
    let surface = host
        .find_surface(&config.surface_id)
        .ok_or_else(|| MissingSurfaceError { id: config.surface_id.clone() })?;
    Ok(SurfaceSizer::new(surface, host.viewport(), host.scheduler()).with_height_delay(config.height_defer_ms))
}

fn spawn_load(loader: &Rc<ModuleLoader>, host: &dyn Host) {
    let loader = Rc::clone(loader);
    host.spawn(Box::pin(async move {
        // The loader has already reported failures to the sink.
        if let Err(err) = loader.load().await {
            log::debug!("module load settled with error: {err}");
        }
    }));
}

impl Boot {
    #[must_use]
    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    #[must_use]
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// The running sizer, or why there is none.
    ///
    /// # Errors
    ///
    /// Returns the [`MissingSurfaceError`] recorded at start.
    pub fn sizer(&self) -> Result<&SurfaceSizer, &MissingSurfaceError> {
        self.sizer.as_deref()
    }

    /// Run a sync outside the resize handler. No-op without a surface.
    pub fn resync(&self) {
        if let Ok(sizer) = &self.sizer {
            sizer.sync_all();
        }
    }

    #[must_use]
    pub fn status(&self) -> BootStatus {
        let viewport = match &self.sizer {
            Ok(sizer) => sizer.viewport_size(),
            Err(_) => None,
        };
        BootStatus {
            config: self.config.clone(),
            module: self.loader.state(),
            surface_attached: self.sizer.is_ok(),
            viewport,
        }
    }

    /// [`Self::status`] as a JSON string.
    #[must_use]
    pub fn status_json(&self) -> String {
        serde_json::to_string(&self.status())
            .unwrap_or_else(|err| format!("{{\"error\":\"status serialization failed: {err}\"}}"))
    }
}
