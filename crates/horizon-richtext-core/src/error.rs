//! Error types for the rich text runtime.

use std::fmt;

/// Timer-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The timer ID is invalid or has already been removed.
    InvalidTimerId,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimerId => write!(f, "Invalid or expired timer ID"),
        }
    }
}

impl std::error::Error for TimerError {}

/// Signal-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The connection ID is invalid or has already been disconnected.
    InvalidConnection,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConnection => write!(f, "Invalid or disconnected connection ID"),
        }
    }
}

impl std::error::Error for SignalError {}

/// Worker-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker has been stopped and no longer accepts tasks.
    Stopped,
    /// The task queue is full.
    QueueFull,
    /// The operating system refused to spawn the worker thread.
    SpawnFailed(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "Worker has been stopped"),
            Self::QueueFull => write!(f, "Worker task queue is full"),
            Self::SpawnFailed(msg) => write!(f, "Failed to spawn worker thread: {msg}"),
        }
    }
}

impl std::error::Error for WorkerError {}
