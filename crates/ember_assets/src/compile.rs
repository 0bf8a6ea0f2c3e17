//! Incremental GPU compilation
//!
//! New instances should not stall the frame thread while their geometry is
//! uploaded. The scene manager hands each instance's geometry to an
//! [`IncrementalCompiler`] and moves on; [`CompileQueue`] is the standard
//! implementation, feeding a worker thread through a channel. The worker
//! records successful uploads in each geometry's per-context GPU slots and
//! reports failures back as [`CompileReport`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use ember_core::{EmberError, Result};
use ember_scene::{ContextId, Geometry, GpuAllocation};

/// Geometry of one new instance, queued for upload.
#[derive(Debug, Clone)]
pub struct CompileBatch {
    pub label: String,
    pub geometries: Vec<Arc<Geometry>>,
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub label: String,
    pub compiled: usize,
    /// Geometry already present in the context.
    pub skipped: usize,
    /// `(geometry label, backend message)` per failed upload.
    pub failures: Vec<(String, String)>,
}

impl CompileReport {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Accepts instances for background GPU preparation.
pub trait IncrementalCompiler: Send + Sync {
    fn enqueue(&self, batch: CompileBatch) -> Result<()>;
}

/// The device side of compilation.
pub trait GpuBackend: Send + Sync {
    fn compile(&self, geometry: &Geometry, context: ContextId) -> std::result::Result<GpuAllocation, String>;
}

/// Backend that only hands out allocation ids. Used without a real device.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: AtomicU64,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GpuBackend for HeadlessBackend {
    fn compile(&self, geometry: &Geometry, _context: ContextId) -> std::result::Result<GpuAllocation, String> {
        Ok(GpuAllocation {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            size_bytes: geometry.byte_size(),
        })
    }
}

/// Worker-thread compiler for a single rendering context.
pub struct CompileQueue {
    context: ContextId,
    sender: Option<flume::Sender<CompileBatch>>,
    reports: flume::Receiver<CompileReport>,
    worker: Option<JoinHandle<()>>,
}

impl CompileQueue {
    pub fn new(backend: Arc<dyn GpuBackend>, context: ContextId) -> Result<Self> {
        let (sender, jobs) = flume::unbounded::<CompileBatch>();
        let (report_tx, reports) = flume::unbounded();

        let worker = std::thread::Builder::new()
            .name(format!("ember-compile-{}", context.0))
            .spawn(move || {
                for batch in jobs.iter() {
                    let report = compile_batch(backend.as_ref(), context, &batch);
                    if report_tx.send(report).is_err() {
                        break;
                    }
                }
                log::debug!("Compile worker for context {} stopped", context.0);
            })?;

        Ok(Self {
            context,
            sender: Some(sender),
            reports,
            worker: Some(worker),
        })
    }

    #[inline]
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Reports of every batch finished since the last call.
    #[must_use]
    pub fn drain_reports(&self) -> Vec<CompileReport> {
        self.reports.try_iter().collect()
    }

    /// Waits for all queued batches and returns their outstanding reports.
    #[must_use]
    pub fn finish(mut self) -> Vec<CompileReport> {
        self.shutdown();
        self.drain_reports()
    }

    fn shutdown(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            log::error!("Compile worker for context {} panicked", self.context.0);
        }
    }
}

impl IncrementalCompiler for CompileQueue {
    fn enqueue(&self, batch: CompileBatch) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| EmberError::Compile("compile queue is shut down".into()))?;
        sender
            .send(batch)
            .map_err(|_| EmberError::Compile("compile worker is gone".into()))
    }
}

impl Drop for CompileQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn compile_batch(backend: &dyn GpuBackend, context: ContextId, batch: &CompileBatch) -> CompileReport {
    let mut report = CompileReport {
        label: batch.label.clone(),
        ..CompileReport::default()
    };

    for geometry in &batch.geometries {
        if geometry.gpu().is_compiled(context) {
            report.skipped += 1;
            continue;
        }
        match backend.compile(geometry, context) {
            Ok(allocation) => {
                geometry.gpu().insert(context, allocation);
                report.compiled += 1;
            }
            Err(message) => {
                log::warn!("Failed to compile '{}' for context {}: {message}", geometry.label, context.0);
                report.failures.push((geometry.label.clone(), message));
            }
        }
    }
    report
}
