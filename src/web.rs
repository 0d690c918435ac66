//! Browser host and JS entry points.
//!
//! Binds the [`boot::Host`] seams to the DOM: the surface is an element's
//! inline style, the viewport is `window.innerWidth` / `innerHeight`,
//! deferred tasks are `setTimeout` via `gloo_timers`, the resize hook is
//! `window.onresize`, and the module is pulled in with a dynamic `import()`.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlElement, Window};

use crate::boot::{self, Boot, Host};
use crate::config::BootConfig;
use crate::consts::MODULE_INIT_EXPORT;
use crate::error::LoadError;
use crate::loader::{DiagnosticSink, LogSink, ModuleSource, resolve_locator};
use crate::sizer::{ResizeEvents, Scheduler, Surface, Viewport};

thread_local! {
    static BOOT: RefCell<Option<Boot>> = const { RefCell::new(None) };
}

#[wasm_bindgen(inline_js = "export function import_module(locator) { return import(locator); }")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn import_module(locator: &str) -> Result<js_sys::Promise, JsValue>;
}

// =============================================================
// Entry points
// =============================================================

/// Module start: install logging, then boot against the page.
///
/// # Errors
///
/// Returns `Err` only when there is no global `window`.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let (config, config_err) = match BootConfig::from_build_env() {
        Ok(config) => (config, None),
        Err(err) => (BootConfig::default(), Some(err)),
    };
    if let Err(err) = console_log::init_with_level(config.log_level) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("console logger not installed: {err}")));
    }
    if let Some(err) = config_err {
        log::error!("{err}; using default configuration");
    }

    let host = WebHost::from_global()?;
    let boot = boot::start(config, &host);
    BOOT.with(|slot| *slot.borrow_mut() = Some(boot));
    Ok(())
}

/// JSON snapshot of the bootstrap, or `null` before start.
#[wasm_bindgen(js_name = bootStatus)]
pub fn boot_status() -> String {
    BOOT.with(|slot| match slot.borrow().as_ref() {
        Some(boot) => boot.status_json(),
        None => "null".to_owned(),
    })
}

/// Resize the surface now, as if the window had been resized.
#[wasm_bindgen]
pub fn resync() {
    BOOT.with(|slot| {
        if let Some(boot) = slot.borrow().as_ref() {
            boot.resync();
        }
    });
}

// =============================================================
// Host
// =============================================================

pub struct WebHost {
    window: Window,
    document: Document,
}

impl WebHost {
    /// # Errors
    ///
    /// Returns `Err` when there is no global `window` or it has no document.
    pub fn from_global() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self { window, document })
    }
}

impl Host for WebHost {
    fn find_surface(&self, id: &str) -> Option<Rc<dyn Surface>> {
        let element = self.document.get_element_by_id(id)?;
        match element.dyn_into::<HtmlElement>() {
            Ok(element) => Some(Rc::new(StyleSurface { element }) as Rc<dyn Surface>),
            Err(_) => {
                log::warn!("#{id} is not an HTML element");
                None
            }
        }
    }

    fn viewport(&self) -> Rc<dyn Viewport> {
        Rc::new(WindowViewport { window: self.window.clone() })
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::new(TimeoutScheduler)
    }

    fn resize_events(&self) -> Rc<dyn ResizeEvents> {
        Rc::new(WindowResize { window: self.window.clone(), handler: RefCell::new(None) })
    }

    fn module_source(&self) -> Box<dyn ModuleSource> {
        Box::new(DynamicImport { document: self.document.clone() })
    }

    fn diagnostics(&self) -> Rc<dyn DiagnosticSink> {
        Rc::new(LogSink)
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

// =============================================================
// Sizing seams
// =============================================================

/// Writes dimensions into the element's inline `style`.
struct StyleSurface {
    element: HtmlElement,
}

impl StyleSurface {
    fn set_px(&self, property: &str, px: f64) {
        if let Err(err) = self.element.style().set_property(property, &format!("{px}px")) {
            log::warn!("surface rejected {property}={px}px: {}", describe(&err));
        }
    }
}

impl Surface for StyleSurface {
    fn set_width(&self, px: f64) {
        self.set_px("width", px);
    }

    fn set_height(&self, px: f64) {
        self.set_px("height", px);
    }
}

struct WindowViewport {
    window: Window,
}

impl Viewport for WindowViewport {
    fn width(&self) -> Option<f64> {
        pixels(self.window.inner_width(), "innerWidth")
    }

    fn height(&self) -> Option<f64> {
        pixels(self.window.inner_height(), "innerHeight")
    }
}

fn pixels(value: Result<JsValue, JsValue>, name: &str) -> Option<f64> {
    match value {
        Ok(value) => value.as_f64(),
        Err(err) => {
            log::warn!("window.{name} unavailable: {}", describe(&err));
            None
        }
    }
}

/// `setTimeout`-backed scheduler. Timeouts are forgotten so they always fire.
struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
    fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, task).forget();
    }
}

/// Owns the closure currently installed as `window.onresize`.
struct WindowResize {
    window: Window,
    handler: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl ResizeEvents for WindowResize {
    fn set_handler(&self, handler: Box<dyn FnMut()>) {
        let closure = Closure::wrap(handler);
        self.window.set_onresize(Some(closure.as_ref().unchecked_ref()));
        // Dropping the old closure is safe now that onresize no longer points at it.
        *self.handler.borrow_mut() = Some(closure);
    }
}

// =============================================================
// Module loading
// =============================================================

/// Loads a module with `import()` and runs its wasm-bindgen init export.
struct DynamicImport {
    document: Document,
}

impl ModuleSource for DynamicImport {
    fn fetch(&self, locator: &str) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        let locator = locator.to_owned();
        let base_uri = self.document.base_uri();
        Box::pin(async move {
            let fetch_err = |err: JsValue| LoadError::Fetch { locator: locator.clone(), reason: describe(&err) };
            let base_uri = base_uri
                .map_err(fetch_err)?
                .ok_or_else(|| LoadError::Fetch { locator: locator.clone(), reason: "document has no base URI".into() })?;
            let resolved = resolve_locator(&locator, &base_uri)?;
            let promise = import_module(&resolved).map_err(fetch_err)?;
            let module = JsFuture::from(promise).await.map_err(fetch_err)?;

            init_module(&module)
                .await
                .map_err(|err| LoadError::Init { locator: locator.clone(), reason: describe(&err) })
        })
    }
}

async fn init_module(module: &JsValue) -> Result<(), JsValue> {
    let init = js_sys::Reflect::get(module, &JsValue::from_str(MODULE_INIT_EXPORT))?;
    let Some(init) = init.dyn_ref::<js_sys::Function>() else {
        // Bundler-style modules initialize themselves on import.
        return Ok(());
    };

    let returned = init.call0(module)?;
    if let Some(promise) = returned.dyn_ref::<js_sys::Promise>() {
        JsFuture::from(promise.clone()).await?;
    }
    Ok(())
}

fn describe(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    match err.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => format!("{err:?}"),
    }
}
