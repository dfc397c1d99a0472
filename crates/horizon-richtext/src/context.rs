//! The editor context: every shared collaborator, constructed explicitly and
//! handed to the controller.
//!
//! ```
//! use horizon_richtext::{EditorConfig, EditorContext};
//!
//! let mut context = EditorContext::builder()
//!     .config(EditorConfig { wrap_text: true, ..Default::default() })
//!     .worker_name("search")
//!     .build()
//!     .unwrap();
//! assert!(context.config().wrap_text);
//! # context.shutdown();
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use horizon_richtext_core::logging::targets;
use horizon_richtext_core::{TimerId, TimerManager, Worker, WorkerConfig};

use crate::config::EditorConfig;
use crate::error::Result;
use crate::format::DataFormatRegistry;
use crate::layout::{MonospaceLayoutEngine, TextLayoutEngine};
use crate::search::SearchOutcome;
use crate::style::{DefaultStyleResolver, StyleHandlerRegistry, StyleResolver};

/// Collaborators shared by the model, layout and controller.
pub struct EditorContext {
    config: EditorConfig,
    timers: TimerManager,
    worker: Worker<SearchOutcome>,
    formats: DataFormatRegistry,
    style_handlers: StyleHandlerRegistry,
    resolver: Arc<dyn StyleResolver>,
    layout_engine: Arc<dyn TextLayoutEngine>,
}

impl EditorContext {
    /// A context with the standard collaborators for `config`.
    pub fn new(config: EditorConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> EditorContextBuilder {
        EditorContextBuilder::default()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn timers(&self) -> &TimerManager {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerManager {
        &mut self.timers
    }

    /// Start a repeating timer.
    pub fn start_repeating_timer(&mut self, now: Instant, interval: Duration) -> TimerId {
        self.timers.start_repeating(now, interval)
    }

    /// Stop a timer; stopping one that already finished is not an error.
    pub fn stop_timer(&mut self, id: TimerId) {
        if self.timers.is_active(id) {
            let _ = self.timers.stop(id);
        }
    }

    /// The background worker used for searches.
    pub fn worker(&self) -> &Worker<SearchOutcome> {
        &self.worker
    }

    pub fn formats(&self) -> &DataFormatRegistry {
        &self.formats
    }

    pub fn formats_mut(&mut self) -> &mut DataFormatRegistry {
        &mut self.formats
    }

    pub fn style_handlers(&self) -> &StyleHandlerRegistry {
        &self.style_handlers
    }

    pub fn style_resolver(&self) -> &Arc<dyn StyleResolver> {
        &self.resolver
    }

    pub fn layout_engine(&self) -> &Arc<dyn TextLayoutEngine> {
        &self.layout_engine
    }

    /// Stop every timer and the worker. Pending callbacks are dropped.
    pub fn shutdown(&mut self) {
        self.timers.stop_all();
        self.worker.stop();
        let dropped = self.worker.discard_callbacks();
        tracing::debug!(target: targets::AREA, dropped, "editor context shut down");
    }
}

impl std::fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorContext")
            .field("config", &self.config)
            .field("timers", &self.timers.active_count())
            .field("worker_running", &self.worker.is_running())
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EditorContext`]. Anything not set gets its standard value.
#[derive(Default)]
pub struct EditorContextBuilder {
    config: Option<EditorConfig>,
    formats: Option<DataFormatRegistry>,
    style_handlers: Option<StyleHandlerRegistry>,
    resolver: Option<Arc<dyn StyleResolver>>,
    layout_engine: Option<Arc<dyn TextLayoutEngine>>,
    worker_name: Option<String>,
}

impl EditorContextBuilder {
    pub fn config(mut self, config: EditorConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn formats(mut self, formats: DataFormatRegistry) -> Self {
        self.formats = Some(formats);
        self
    }

    pub fn style_handlers(mut self, handlers: StyleHandlerRegistry) -> Self {
        self.style_handlers = Some(handlers);
        self
    }

    pub fn style_resolver(mut self, resolver: impl StyleResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn layout_engine(mut self, engine: impl TextLayoutEngine + 'static) -> Self {
        self.layout_engine = Some(Arc::new(engine));
        self
    }

    /// Name of the background worker thread.
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.worker_name = Some(name.into());
        self
    }

    /// Build the context, starting its worker thread.
    pub fn build(self) -> Result<EditorContext> {
        let config = self.config.unwrap_or_default();
        let name = self.worker_name.unwrap_or_else(|| "richtext-worker".to_string());
        let worker = Worker::with_config(WorkerConfig::with_name(name))?;

        let formats = self
            .formats
            .unwrap_or_else(|| DataFormatRegistry::standard(config.line_ending));
        let layout_engine = self
            .layout_engine
            .unwrap_or_else(|| Arc::new(MonospaceLayoutEngine::default().with_tab_size(config.tab_size)));

        Ok(EditorContext {
            timers: TimerManager::new(),
            worker,
            formats,
            style_handlers: self.style_handlers.unwrap_or_else(StyleHandlerRegistry::standard),
            resolver: self
                .resolver
                .unwrap_or_else(|| Arc::new(DefaultStyleResolver::default())),
            layout_engine,
            config,
        })
    }
}
