//! Scoped wall-clock and memory measurement for the calling layer.
//!
//! Nothing in the recoloring core measures itself; callers wrap whatever they
//! want to observe:
//!
//! ```no_run
//! use polygon_recolor::measure::measure;
//!
//! let (sum, report) = measure("sum", || (0..1_000u64).sum::<u64>());
//! println!("{sum} in {:?}", report.elapsed);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};

/// How often the background sampler polls resident memory.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// Outcome of one measured scope.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementReport {
    pub name: String,
    pub elapsed: Duration,
    /// Highest resident memory of this process seen while the scope was open.
    /// `None` when the platform does not expose it.
    pub peak_memory_bytes: Option<u64>,
}

impl MeasurementReport {
    pub fn peak_memory_mib(&self) -> Option<f64> {
        self.peak_memory_bytes
            .map(|bytes| bytes as f64 / 1024.0 / 1024.0)
    }

    fn log(&self) {
        tracing::info!(
            name = %self.name,
            "execution took {:.4} seconds",
            self.elapsed.as_secs_f64()
        );
        if let Some(mib) = self.peak_memory_mib() {
            tracing::info!(name = %self.name, "peak memory usage: {mib:.2} MiB");
        }
    }
}

/// A running timer plus memory sampler. Reports on [`finish`](Self::finish) or drop.
pub struct ScopedMeasurement {
    name: String,
    start: Instant,
    sampler: Option<MemorySampler>,
    reported: bool,
}

impl ScopedMeasurement {
    pub fn start(name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::info!(name = %name, "running");
        Self {
            name,
            start: Instant::now(),
            sampler: MemorySampler::spawn(SAMPLE_INTERVAL),
            reported: false,
        }
    }

    /// Stops the sampler, logs and returns the report.
    pub fn finish(mut self) -> MeasurementReport {
        self.report()
    }

    fn report(&mut self) -> MeasurementReport {
        let elapsed = self.start.elapsed();
        let peak_memory_bytes = self.sampler.take().and_then(MemorySampler::stop);
        let report = MeasurementReport {
            name: self.name.clone(),
            elapsed,
            peak_memory_bytes,
        };
        report.log();
        self.reported = true;
        report
    }
}

impl Drop for ScopedMeasurement {
    fn drop(&mut self) {
        if !self.reported {
            self.report();
        }
    }
}

/// Runs `f` inside a [`ScopedMeasurement`] named `name`.
pub fn measure<T>(name: &str, f: impl FnOnce() -> T) -> (T, MeasurementReport) {
    let scope = ScopedMeasurement::start(name);
    let value = f();
    (value, scope.finish())
}

struct MemorySampler {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Option<u64>>,
}

impl MemorySampler {
    fn spawn(interval: Duration) -> Option<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("memory-sampler".into())
            .spawn(move || {
                let pid = Pid::from_u32(std::process::id());
                let mut system = System::new();
                let mut peak = None;
                loop {
                    let done = flag.load(Ordering::Acquire);
                    if let Some(bytes) = sample_memory(&mut system, pid) {
                        peak = Some(peak.map_or(bytes, |p: u64| p.max(bytes)));
                    }
                    if done {
                        break peak;
                    }
                    thread::park_timeout(interval);
                }
            });

        match handle {
            Ok(handle) => Some(Self { stop, handle }),
            Err(e) => {
                tracing::warn!("memory sampler unavailable: {e}");
                None
            }
        }
    }

    fn stop(self) -> Option<u64> {
        self.stop.store(true, Ordering::Release);
        self.handle.thread().unpark();
        self.handle.join().ok().flatten()
    }
}

fn sample_memory(system: &mut System, pid: Pid) -> Option<u64> {
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    let bytes = system.process(pid)?.memory();
    tracing::trace!(bytes, "memory sample");
    Some(bytes)
}
