//! Single dedicated background thread with its own task queue.
//!
//! The editor core is single threaded. Work that may take long (searching a
//! large document, for instance) is handed to a [`Worker`], which runs tasks
//! sequentially on its own thread. Results come back in one of two ways:
//!
//! - [`Worker::send`] emits the result through [`Worker::on_result`] on the
//!   worker thread;
//! - [`Worker::send_with_callback`] queues the callback for the owning thread,
//!   which runs it when it calls [`Worker::process_callbacks`]. This is how
//!   results are marshalled back before they touch the model or selection.
//!
//! # Example
//!
//! ```no_run
//! use horizon_richtext_core::worker::Worker;
//!
//! let worker = Worker::<usize>::new().unwrap();
//! worker
//!     .send_with_callback(|| 6 * 7, |answer| println!("answer: {answer}"))
//!     .unwrap();
//!
//! // Later, on the owning thread:
//! worker.process_callbacks();
//! worker.stop_and_join();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};
use parking_lot::{Condvar, Mutex};

use crate::cancellation::CancellationToken;
use crate::error::WorkerError;
use crate::signal::Signal;

/// Default capacity for the worker's task queue.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// How often an idle worker re-checks for shutdown.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Configuration for creating a Worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Name for the worker thread.
    pub name: String,
    /// Stack size for the worker thread in bytes. `None` uses the default.
    pub stack_size: Option<usize>,
    /// Capacity of the task queue.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "richtext-worker".to_string(),
            stack_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl WorkerConfig {
    /// Create a new configuration with the given thread name.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Builder for creating Workers with custom configuration.
#[derive(Debug, Default)]
pub struct WorkerBuilder {
    config: WorkerConfig,
}

impl WorkerBuilder {
    /// Create a new WorkerBuilder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the stack size for the worker thread.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Set the task queue capacity.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Build and start the worker.
    pub fn build<T: Send + 'static>(self) -> Result<Worker<T>, WorkerError> {
        Worker::with_config(self.config)
    }
}

struct WorkerState {
    running: AtomicBool,
    cancellation: CancellationToken,
    pending_tasks: AtomicUsize,
    shutdown_condvar: Condvar,
    shutdown_mutex: Mutex<bool>,
}

impl WorkerState {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            cancellation: CancellationToken::new(),
            pending_tasks: AtomicUsize::new(0),
            shutdown_condvar: Condvar::new(),
            shutdown_mutex: Mutex::new(false),
        }
    }

    fn signal_shutdown(&self) {
        let mut finished = self.shutdown_mutex.lock();
        *finished = true;
        self.shutdown_condvar.notify_all();
    }
}

type Callback = Box<dyn FnOnce() + Send>;

enum WorkerTask<T> {
    /// Execute a task and emit the result via the signal.
    Execute(Box<dyn FnOnce() -> T + Send>),
    /// Execute a task and queue the callback for the owning thread.
    ExecuteWithCallback {
        task: Box<dyn FnOnce() -> T + Send>,
        callback: Box<dyn FnOnce(T) + Send>,
    },
    Shutdown,
}

/// A dedicated worker thread with its own task queue.
///
/// `Worker<T>` is `Send + Sync`; any thread may submit tasks. Callbacks
/// registered through [`send_with_callback`](Self::send_with_callback) only run
/// inside [`process_callbacks`](Self::process_callbacks).
pub struct Worker<T: Send + 'static> {
    task_sender: Sender<WorkerTask<T>>,
    callback_receiver: Receiver<Callback>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Arc<WorkerState>,
    result_signal: Arc<Signal<T>>,
}

impl<T: Send + 'static> Worker<T> {
    /// Create a new worker with default configuration.
    ///
    /// The worker thread starts immediately and begins processing tasks.
    pub fn new() -> Result<Self, WorkerError> {
        Self::with_config(WorkerConfig::default())
    }

    /// Create a new worker with custom configuration.
    pub fn with_config(config: WorkerConfig) -> Result<Self, WorkerError> {
        let (sender, receiver) = bounded(config.queue_capacity);
        let (callback_sender, callback_receiver) = unbounded();
        let state = Arc::new(WorkerState::new());
        let result_signal = Arc::new(Signal::new());

        let thread_state = state.clone();
        let thread_signal = result_signal.clone();

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let handle = builder
            .spawn(move || {
                worker_loop(receiver, callback_sender, &thread_state, &thread_signal);
                thread_state.running.store(false, Ordering::Release);
                thread_state.signal_shutdown();
            })
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        tracing::debug!(target: "horizon_richtext_core::worker", name = %config.name, "worker started");

        Ok(Self {
            task_sender: sender,
            callback_receiver,
            handle: Mutex::new(Some(handle)),
            state,
            result_signal,
        })
    }

    /// Check if the worker is still accepting tasks.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Get the number of tasks queued or executing.
    pub fn pending_tasks(&self) -> usize {
        self.state.pending_tasks.load(Ordering::Acquire)
    }

    /// Signal emitted on the worker thread with the result of each
    /// [`send`](Self::send) task.
    pub fn on_result(&self) -> &Signal<T> {
        &self.result_signal
    }

    /// Send a task whose result is emitted through [`on_result`](Self::on_result).
    pub fn send<F>(&self, task: F) -> Result<(), WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.submit(WorkerTask::Execute(Box::new(task)))
    }

    /// Send a task whose result is handed to `callback` on the owning thread.
    ///
    /// The callback runs during the next [`process_callbacks`](Self::process_callbacks)
    /// call after the task finished.
    pub fn send_with_callback<F, C>(&self, task: F, callback: C) -> Result<(), WorkerError>
    where
        F: FnOnce() -> T + Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        self.submit(WorkerTask::ExecuteWithCallback {
            task: Box::new(task),
            callback: Box::new(callback),
        })
    }

    fn submit(&self, task: WorkerTask<T>) -> Result<(), WorkerError> {
        if !self.is_running() {
            return Err(WorkerError::Stopped);
        }

        self.state.pending_tasks.fetch_add(1, Ordering::AcqRel);

        match self.task_sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
                match err {
                    TrySendError::Full(_) => Err(WorkerError::QueueFull),
                    TrySendError::Disconnected(_) => Err(WorkerError::Stopped),
                }
            }
        }
    }

    /// Run every callback whose task has completed. Call this from the
    /// owning thread. Returns the number of callbacks run.
    pub fn process_callbacks(&self) -> usize {
        let mut count = 0;
        while let Ok(callback) = self.callback_receiver.try_recv() {
            callback();
            count += 1;
        }
        count
    }

    /// Drop completed callbacks without running them.
    pub fn discard_callbacks(&self) -> usize {
        self.callback_receiver.try_iter().count()
    }

    /// Request the worker to stop after processing remaining tasks.
    ///
    /// Non-blocking. After calling `stop()`, no new tasks are accepted and the
    /// worker's cancellation token reports cancelled.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::Release);
        self.state.cancellation.cancel();
        let _ = self.task_sender.try_send(WorkerTask::Shutdown);
    }

    /// Wait for the worker thread to finish.
    ///
    /// Returns `true` if the worker was joined successfully, `false` if
    /// already joined or the thread panicked.
    pub fn join(&self) -> bool {
        let mut handle = self.handle.lock();
        if let Some(h) = handle.take() {
            h.join().is_ok()
        } else {
            false
        }
    }

    /// Stop the worker and wait for it to finish.
    pub fn stop_and_join(&self) -> bool {
        self.stop();
        self.join()
    }

    /// Wait for the worker thread to exit, up to `timeout`.
    ///
    /// Returns `true` if the worker finished within the timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut finished = self.state.shutdown_mutex.lock();
        if !*finished {
            self.state.shutdown_condvar.wait_for(&mut finished, timeout);
        }
        *finished
    }

    /// The worker-wide cancellation token, cancelled by [`stop`](Self::stop).
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.state.cancellation
    }
}

impl<T: Send + 'static> Drop for Worker<T> {
    fn drop(&mut self) {
        self.stop();
        // Don't block in drop - just request shutdown
    }
}

static_assertions::assert_impl_all!(Worker<String>: Send, Sync);

fn run_task<T>(
    task: WorkerTask<T>,
    callbacks: &Sender<Callback>,
    state: &WorkerState,
    result_signal: &Signal<T>,
) where
    T: Send + 'static,
{
    match task {
        WorkerTask::Execute(task) => {
            let result = task();
            result_signal.emit(result);
        }
        WorkerTask::ExecuteWithCallback { task, callback } => {
            let result = task();
            let _ = callbacks.send(Box::new(move || callback(result)));
        }
        WorkerTask::Shutdown => return,
    }
    state.pending_tasks.fetch_sub(1, Ordering::AcqRel);
}

fn worker_loop<T: Send + 'static>(
    receiver: Receiver<WorkerTask<T>>,
    callbacks: Sender<Callback>,
    state: &WorkerState,
    result_signal: &Signal<T>,
) {
    loop {
        match receiver.recv_timeout(IDLE_POLL) {
            Ok(WorkerTask::Shutdown) => {
                // Drain what was queued before the stop request.
                while let Ok(task) = receiver.try_recv() {
                    run_task(task, &callbacks, state, result_signal);
                }
                break;
            }
            Ok(task) => run_task(task, &callbacks, state, result_signal),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                if state.cancellation.is_cancelled()
                    && state.pending_tasks.load(Ordering::Acquire) == 0
                {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!(target: "horizon_richtext_core::worker", "worker loop exited");
}
