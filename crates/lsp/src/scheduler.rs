// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Recompilation Scheduler
//!
//! This module owns debounce timing and in-flight tracking for compile
//! requests.
//!
//! ## Overview
//!
//! Each document gets one scheduler backed by a background tokio task. The
//! task waits on a request channel with a debounce deadline: every request
//! arriving inside the quiet window resets the deadline, so a burst of edits
//! collapses into a single compiler invocation once the window elapses.
//!
//! ## Supersede semantics
//!
//! There is no mid-flight cancellation. A request arriving while a compile is
//! running queues in the channel; the worker picks it up after the current
//! compile's result has been applied and debounces a fresh compile. In-flight
//! results are therefore always applied (the compiler reflects the latest
//! submitted source), and staleness is handled by coalescing requests rather
//! than discarding results.
//!
//! ## Events
//!
//! Results are reported through a [`CompileEvents`] handler injected at
//! construction; there are no hidden global emitters. The handler also
//! receives a start signal for progress reporting and a cross-document
//! "all jobs finished" signal driven by the shared [`CompileJobs`] counter.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use templated_sql_lsp_compiler::{Compiler, CompilerError};

/// Default quiet period between the last edit and the compile
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default upper bound for a single compile run
pub const DEFAULT_COMPILE_TIMEOUT: Duration = Duration::from_secs(60);

/// Timing settings for a scheduler
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    /// Quiet period before a compile fires
    pub debounce: Duration,

    /// Upper bound for one compile run
    pub compile_timeout: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            compile_timeout: DEFAULT_COMPILE_TIMEOUT,
        }
    }
}

/// Count of in-flight compile jobs across all open documents
///
/// Shared by every scheduler in a session; the transition back to zero fires
/// the session-wide "all compilations finished" event.
#[derive(Debug, Default)]
pub struct CompileJobs {
    active: AtomicUsize,
}

impl CompileJobs {
    /// Create a new counter
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job start
    fn begin(&self) -> usize {
        self.active.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a job end, returning the number of jobs still running
    fn finish(&self) -> usize {
        self.active.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Number of jobs currently running
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Handler for compile lifecycle events
///
/// Implemented by the document controller and injected into the scheduler at
/// construction time.
#[async_trait::async_trait]
pub trait CompileEvents: Send + Sync {
    /// A compile run started for this document
    async fn on_compilation_started(&self);

    /// A compile run produced expanded SQL
    async fn on_compilation_finished(&self, compiled_sql: String);

    /// A compile run failed; `raw_error_text` is the compiler's output
    async fn on_compilation_error(&self, raw_error_text: String);

    /// The last in-flight compile across all documents finished
    async fn on_finish_all_compile_jobs(&self);
}

/// Per-document compile scheduler
pub struct CompileScheduler {
    tx: mpsc::Sender<()>,
    in_flight: Arc<AtomicBool>,
}

impl CompileScheduler {
    /// Spawn a scheduler worker for one document
    ///
    /// # Arguments
    ///
    /// - `settings`: Debounce and timeout configuration
    /// - `model`: Model identifier submitted to the compiler
    /// - `compiler`: The external compiler seam
    /// - `jobs`: Session-wide in-flight counter
    /// - `events`: Result handler (the document controller)
    pub fn spawn(
        settings: SchedulerSettings,
        model: String,
        compiler: Arc<dyn Compiler>,
        jobs: Arc<CompileJobs>,
        events: Arc<dyn CompileEvents>,
    ) -> Self {
        // Capacity covers a burst of requests; overflow is safe to drop
        // because any queued request already guarantees a future compile.
        let (tx, rx) = mpsc::channel(64);
        let in_flight = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            rx,
            settings,
            model,
            compiler,
            jobs,
            events,
            in_flight: in_flight.clone(),
        };
        tokio::spawn(worker.run());

        Self { tx, in_flight }
    }

    /// Request a (debounced) compile
    ///
    /// Calls within the quiet window coalesce into one compiler invocation.
    pub fn request_compile(&self) {
        match self.tx.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => {
                debug!("compile request queue full, request already pending");
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                warn!("compile worker gone, request dropped");
            }
        }
    }

    /// Whether a compile for this document is currently running
    pub fn is_compiling(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Background worker owning the debounce deadline
struct Worker {
    rx: mpsc::Receiver<()>,
    settings: SchedulerSettings,
    model: String,
    compiler: Arc<dyn Compiler>,
    jobs: Arc<CompileJobs>,
    events: Arc<dyn CompileEvents>,
    in_flight: Arc<AtomicBool>,
}

impl Worker {
    async fn run(mut self) {
        let mut deadline: Option<Instant> = None;
        loop {
            let request = match deadline {
                Some(at) => {
                    let outcome = timeout_at(at, self.rx.recv()).await;
                    match outcome {
                        Ok(request) => request,
                        Err(_) => {
                            // Quiet window elapsed: the burst is over
                            deadline = None;
                            self.run_compile().await;
                            continue;
                        }
                    }
                }
                None => self.rx.recv().await,
            };
            let Some(()) = request else {
                // Scheduler dropped (document closed)
                break;
            };
            deadline = Some(Instant::now() + self.settings.debounce);
        }
    }

    async fn run_compile(&self) {
        self.in_flight.store(true, Ordering::SeqCst);
        self.jobs.begin();
        info!("Compiling model: {}", self.model);
        self.events.on_compilation_started().await;

        let result = match timeout(
            self.settings.compile_timeout,
            self.compiler.compile(&self.model),
        )
        .await
        {
            Ok(Ok(sql)) => Ok(sql),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => {
                Err(CompilerError::Timeout(self.settings.compile_timeout.as_secs()).to_string())
            }
        };

        match result {
            Ok(sql) => {
                debug!("Compile finished for model: {}", self.model);
                self.events.on_compilation_finished(sql).await;
            }
            Err(text) => {
                warn!("Compile failed for model {}: {}", self.model, text.trim());
                self.events.on_compilation_error(text).await;
            }
        }

        // The flag clears only after the result has been applied, so edits
        // racing the application are still detected as dirty.
        self.in_flight.store(false, Ordering::SeqCst);
        if self.jobs.finish() == 0 {
            self.events.on_finish_all_compile_jobs().await;
        }
    }
}
