//! Logging facilities for the rich text engine.
//!
//! Everything is instrumented with the `tracing` crate. The library never
//! installs a subscriber; applications (and tests) do that themselves:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_richtext::layout=debug")
//!     .init();
//! ```

/// Span names used throughout the engine.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Signal emission span.
    pub const SIGNAL: &str = "horizon_richtext::signal";
    /// Timer processing span.
    pub const TIMER: &str = "horizon_richtext::timer";
    /// Layout pass span.
    pub const LAYOUT: &str = "horizon_richtext::layout";
    /// Model edit span.
    pub const EDIT: &str = "horizon_richtext::edit";
    /// Background search span.
    pub const SEARCH: &str = "horizon_richtext::search";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Runtime crate target.
    pub const CORE: &str = "horizon_richtext_core";
    /// Timer system target.
    pub const TIMER: &str = "horizon_richtext_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_richtext_core::signal";
    /// Background worker target.
    pub const WORKER: &str = "horizon_richtext_core::worker";
    /// Document model target.
    pub const MODEL: &str = "horizon_richtext::model";
    /// Selection model target.
    pub const SELECTION: &str = "horizon_richtext::selection";
    /// Layout engine target.
    pub const LAYOUT: &str = "horizon_richtext::layout";
    /// Data format codecs target.
    pub const FORMAT: &str = "horizon_richtext::format";
    /// Controller target.
    pub const AREA: &str = "horizon_richtext::area";
    /// Background search target.
    pub const SEARCH: &str = "horizon_richtext::search";
    /// Performance spans target.
    pub const PERF: &str = "horizon_richtext::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations such as a layout pass.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_richtext::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with a consistent target.
#[macro_export]
macro_rules! richtext_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_richtext_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! richtext_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_richtext_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! richtext_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "horizon_richtext_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! richtext_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "horizon_richtext_core", $($arg)*)
    };
}

#[macro_export]
macro_rules! richtext_error {
    ($($arg:tt)*) => {
        tracing::error!(target: "horizon_richtext_core", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let _span = PerfSpan::new("test_operation");
        crate::richtext_debug!(value = 3, "inside perf span");
    }

    #[test]
    fn test_targets_are_module_paths() {
        assert!(targets::TIMER.starts_with(targets::CORE));
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }
}
