//! Runtime plumbing for the Horizon rich text engine.
//!
//! This crate knows nothing about documents. It provides the small set of
//! primitives the editing engine is built on:
//!
//! - **Signal/Slot System**: synchronous, ordered change notification
//! - **Timers**: cooperative one-shot and repeating timers driven by the owner
//! - **Worker**: a single background thread whose results are marshalled back
//!   to the owning thread
//! - **Cancellation**: a shared flag checked between units of background work
//! - **Logging**: `tracing` targets, span names and a performance span guard
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_richtext_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use horizon_richtext_core::TimerManager;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut timers = TimerManager::new();
//! let blink = timers.start_repeating(start, Duration::from_millis(500));
//! assert_eq!(timers.process_expired(start + Duration::from_millis(500)), vec![blink]);
//! ```

mod cancellation;
mod error;
pub mod logging;
pub mod signal;
mod timer;
pub mod worker;

pub use cancellation::CancellationToken;
pub use error::{SignalError, TimerError, WorkerError};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{TimerId, TimerKind, TimerManager};
pub use worker::{Worker, WorkerBuilder, WorkerConfig};
