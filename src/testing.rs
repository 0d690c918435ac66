//! In-memory host fakes shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};

use crate::boot::Host;
use crate::error::LoadError;
use crate::loader::{DiagnosticSink, ModuleSource};
use crate::sizer::{ResizeEvents, Scheduler, Surface, Viewport};

// =============================================================
// Surface
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceWrite {
    Width(f64),
    Height(f64),
}

/// Surface that remembers its dimensions and every write, in order.
#[derive(Default)]
pub struct RecordingSurface {
    width: Cell<f64>,
    height: Cell<f64>,
    writes: RefCell<Vec<SurfaceWrite>>,
}

impl RecordingSurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width.get(), self.height.get())
    }

    pub fn writes(&self) -> Vec<SurfaceWrite> {
        self.writes.borrow().clone()
    }
}

impl Surface for RecordingSurface {
    fn set_width(&self, px: f64) {
        self.width.set(px);
        self.writes.borrow_mut().push(SurfaceWrite::Width(px));
    }

    fn set_height(&self, px: f64) {
        self.height.set(px);
        self.writes.borrow_mut().push(SurfaceWrite::Height(px));
    }
}

// =============================================================
// Viewport
// =============================================================

/// Viewport whose size the test controls.
pub struct FakeViewport {
    size: Cell<Option<(f64, f64)>>,
}

impl FakeViewport {
    pub fn new(width: f64, height: f64) -> Rc<Self> {
        Rc::new(Self { size: Cell::new(Some((width, height))) })
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.size.set(Some((width, height)));
    }

    /// Make both axes unreadable.
    pub fn go_dark(&self) {
        self.size.set(None);
    }
}

impl Viewport for FakeViewport {
    fn width(&self) -> Option<f64> {
        self.size.get().map(|(w, _)| w)
    }

    fn height(&self) -> Option<f64> {
        self.size.get().map(|(_, h)| h)
    }
}

// =============================================================
// Scheduler
// =============================================================

/// Scheduler that holds deferred tasks until the test runs them.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<VecDeque<(u32, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.queue.borrow().iter().map(|(delay, _)| *delay).collect()
    }

    /// Run the oldest pending task. Returns `false` when the queue is empty.
    pub fn run_next(&self) -> bool {
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including ones scheduled meanwhile.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, delay_ms: u32, task: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back((delay_ms, task));
    }
}

// =============================================================
// Resize notifications
// =============================================================

/// Single-slot resize registration the test can fire.
#[derive(Default)]
pub struct FakeResize {
    handler: RefCell<Option<Box<dyn FnMut()>>>,
    registrations: Cell<usize>,
}

impl FakeResize {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn registrations(&self) -> usize {
        self.registrations.get()
    }

    pub fn has_handler(&self) -> bool {
        self.handler.borrow().is_some()
    }

    /// Deliver one resize notification. Returns `false` if nothing is registered.
    pub fn fire(&self) -> bool {
        let taken = self.handler.borrow_mut().take();
        let Some(mut handler) = taken else {
            return false;
        };
        handler();
        let mut slot = self.handler.borrow_mut();
        if slot.is_none() {
            *slot = Some(handler);
        }
        true
    }
}

impl ResizeEvents for FakeResize {
    fn set_handler(&self, handler: Box<dyn FnMut()>) {
        self.registrations.set(self.registrations.get() + 1);
        *self.handler.borrow_mut() = Some(handler);
    }
}

// =============================================================
// Module loading
// =============================================================

#[derive(Default)]
pub struct RecordingSink {
    errors: RefCell<Vec<LoadError>>,
}

impl RecordingSink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn errors(&self) -> Vec<LoadError> {
        self.errors.borrow().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, error: &LoadError) {
        self.errors.borrow_mut().push(error.clone());
    }
}

enum Script {
    Ready(Result<(), LoadError>),
    Gated(RefCell<Option<oneshot::Receiver<Result<(), LoadError>>>>),
}

/// Module source with a scripted outcome and a shared call counter.
pub struct ScriptedSource {
    script: Script,
    calls: Rc<Cell<usize>>,
}

impl ScriptedSource {
    pub fn succeeding() -> Self {
        Self { script: Script::Ready(Ok(())), calls: Rc::default() }
    }

    pub fn failing(error: LoadError) -> Self {
        Self { script: Script::Ready(Err(error)), calls: Rc::default() }
    }

    /// A source whose fetch stays pending until the returned sender resolves it.
    pub fn gated() -> (Self, oneshot::Sender<Result<(), LoadError>>) {
        let (tx, rx) = oneshot::channel();
        (Self { script: Script::Gated(RefCell::new(Some(rx))), calls: Rc::default() }, tx)
    }

    pub fn calls(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.calls)
    }
}

impl ModuleSource for ScriptedSource {
    fn fetch(&self, locator: &str) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        self.calls.set(self.calls.get() + 1);
        match &self.script {
            Script::Ready(outcome) => Box::pin(futures::future::ready(outcome.clone())),
            Script::Gated(rx) => {
                let rx = rx.borrow_mut().take();
                let locator = locator.to_owned();
                Box::pin(async move {
                    match rx {
                        Some(rx) => rx
                            .await
                            .unwrap_or_else(|_| Err(LoadError::Fetch { locator, reason: "gate dropped".into() })),
                        None => Err(LoadError::Fetch { locator, reason: "gate already used".into() }),
                    }
                })
            }
        }
    }
}

// =============================================================
// Host
// =============================================================

/// Host assembled from the fakes above. Spawned tasks are queued for the test to drive.
pub struct FakeHost {
    pub surface: Option<Rc<RecordingSurface>>,
    pub viewport: Rc<FakeViewport>,
    pub scheduler: Rc<ManualScheduler>,
    pub resize: Rc<FakeResize>,
    pub sink: Rc<RecordingSink>,
    source: RefCell<Option<ScriptedSource>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    lookups: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new(width: f64, height: f64, source: ScriptedSource) -> Self {
        Self {
            surface: Some(RecordingSurface::new()),
            viewport: FakeViewport::new(width, height),
            scheduler: ManualScheduler::new(),
            resize: FakeResize::new(),
            sink: RecordingSink::new(),
            source: RefCell::new(Some(source)),
            tasks: RefCell::default(),
            lookups: RefCell::default(),
        }
    }

    pub fn without_surface(mut self) -> Self {
        self.surface = None;
        self
    }

    pub fn surface(&self) -> Rc<RecordingSurface> {
        match &self.surface {
            Some(surface) => Rc::clone(surface),
            None => panic!("fake host has no surface"),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.borrow().clone()
    }

    pub fn spawned(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Poll each spawned task once and keep the ones still pending.
    pub fn poll_tasks(&self) -> usize {
        let mut tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        tasks.retain_mut(|task| task.as_mut().now_or_never().is_none());
        let pending = tasks.len();
        self.tasks.borrow_mut().extend(tasks);
        pending
    }

    /// Drive every spawned task to completion.
    pub fn run_tasks(&self) {
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        for task in tasks {
            futures::executor::block_on(task);
        }
    }
}

impl Host for FakeHost {
    fn find_surface(&self, id: &str) -> Option<Rc<dyn Surface>> {
        self.lookups.borrow_mut().push(id.to_owned());
        self.surface
            .as_ref()
            .map(|surface| Rc::clone(surface) as Rc<dyn Surface>)
    }

    fn viewport(&self) -> Rc<dyn Viewport> {
        Rc::clone(&self.viewport) as Rc<dyn Viewport>
    }

    fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.scheduler) as Rc<dyn Scheduler>
    }

    fn resize_events(&self) -> Rc<dyn ResizeEvents> {
        Rc::clone(&self.resize) as Rc<dyn ResizeEvents>
    }

    fn module_source(&self) -> Box<dyn ModuleSource> {
        match self.source.borrow_mut().take() {
            Some(source) => Box::new(source),
            None => Box::new(ScriptedSource::failing(LoadError::Fetch {
                locator: String::new(),
                reason: "module source requested twice".into(),
            })),
        }
    }

    fn diagnostics(&self) -> Rc<dyn DiagnosticSink> {
        Rc::clone(&self.sink) as Rc<dyn DiagnosticSink>
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}
