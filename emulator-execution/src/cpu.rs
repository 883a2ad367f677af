//! CPU stressor
//!
//! Consumes a precise amount of CPU time on a number of worker threads. The
//! busy loop measures its own thread CPU clock, so a worker is optionally
//! pinned to the core it starts on while it spins.

use crate::error::{ExecutionError, ExecutionResult};
use emulator_config::{CpuStrategyKind, ExecutionConfig};
use emulator_logging::thread_cpu_time;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How one worker consumes its budget on the calling thread
pub trait CpuStrategy: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Block the calling thread until `budget` has been consumed
    fn consume(&self, budget: Duration);
}

/// Spin until the thread CPU clock has advanced by the budget
#[derive(Debug, Clone, Copy)]
pub struct BusyLoop {
    lock_thread: bool,
}

impl BusyLoop {
    pub fn new(lock_thread: bool) -> Self {
        Self { lock_thread }
    }
}

impl Default for BusyLoop {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CpuStrategy for BusyLoop {
    fn name(&self) -> &'static str {
        "busy_loop"
    }

    fn consume(&self, budget: Duration) {
        if budget.is_zero() {
            return;
        }

        let _pinned = if self.lock_thread {
            affinity::AffinityGuard::pin_current()
                .map_err(|e| debug!("Could not pin CPU worker: {}", e))
                .ok()
        } else {
            None
        };

        spin_for(budget, thread_cpu_time);
    }
}

/// Spin until `clock` has advanced by `budget`, finishing on wall time if the clock fails
fn spin_for(budget: Duration, mut clock: impl FnMut() -> nix::Result<Duration>) {
    let remaining = match clock() {
        Ok(start) => {
            let target = start + budget;
            let mut last = start;
            loop {
                match clock() {
                    Ok(now) if now >= target => return,
                    Ok(now) => {
                        last = now;
                        std::hint::spin_loop();
                    }
                    Err(e) => {
                        warn!("Thread CPU clock failed mid-loop ({}), spinning on wall time", e);
                        break target.saturating_sub(last);
                    }
                }
            }
        }
        Err(e) => {
            warn!("Thread CPU clock unavailable ({}), spinning on wall time", e);
            budget
        }
    };

    let start = Instant::now();
    while start.elapsed() < remaining {
        std::hint::spin_loop();
    }
}

/// Sleep for the budget; keeps timings without burning CPU
#[derive(Debug, Clone, Copy, Default)]
pub struct CalibratedSleep;

impl CpuStrategy for CalibratedSleep {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn consume(&self, budget: Duration) {
        std::thread::sleep(budget);
    }
}

/// Runs a [`CpuStrategy`] on one or more worker threads
#[derive(Debug, Clone)]
pub struct CpuStressor {
    strategy: Arc<dyn CpuStrategy>,
}

impl CpuStressor {
    pub fn new(strategy: Arc<dyn CpuStrategy>) -> Self {
        Self { strategy }
    }

    pub fn from_config(config: &ExecutionConfig) -> Self {
        let strategy: Arc<dyn CpuStrategy> = match config.cpu_strategy {
            CpuStrategyKind::BusyLoop => Arc::new(BusyLoop::new(config.lock_threads)),
            CpuStrategyKind::Sleep => Arc::new(CalibratedSleep),
        };
        Self::new(strategy)
    }

    pub fn strategy(&self) -> &dyn CpuStrategy {
        self.strategy.as_ref()
    }

    /// Consume `duration_secs` on each of `threads` workers, blocking until all finish.
    ///
    /// A non-positive duration is a no-op.
    pub fn run(&self, duration_secs: f64, threads: usize) -> ExecutionResult<()> {
        let budget = match Duration::try_from_secs_f64(duration_secs) {
            Ok(budget) if !budget.is_zero() => budget,
            _ => return Ok(()),
        };

        if threads <= 1 {
            self.strategy.consume(budget);
            return Ok(());
        }

        debug!(
            "Running {} {} CPU workers for {:?}",
            threads,
            self.strategy.name(),
            budget
        );

        std::thread::scope(|scope| {
            let mut workers = Vec::with_capacity(threads);
            for i in 0..threads {
                let strategy = self.strategy.as_ref();
                let worker = std::thread::Builder::new()
                    .name(format!("cpu-worker-{}", i))
                    .spawn_scoped(scope, move || strategy.consume(budget))?;
                workers.push(worker);
            }

            for worker in workers {
                worker.join().map_err(|_| ExecutionError::WorkerPanicked)?;
            }
            Ok(())
        })
    }
}

#[cfg(target_os = "linux")]
mod affinity {
    use nix::sched::{sched_getaffinity, sched_getcpu, sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    /// Pins the calling thread to its current core and restores the original mask on drop
    pub struct AffinityGuard {
        original: CpuSet,
    }

    impl AffinityGuard {
        pub fn pin_current() -> nix::Result<Self> {
            let this_thread = Pid::from_raw(0);
            let original = sched_getaffinity(this_thread)?;

            let mut pinned = CpuSet::new();
            pinned.set(sched_getcpu()?)?;
            sched_setaffinity(this_thread, &pinned)?;

            Ok(Self { original })
        }
    }

    impl Drop for AffinityGuard {
        fn drop(&mut self) {
            let _ = sched_setaffinity(Pid::from_raw(0), &self.original);
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod affinity {
    /// Thread pinning is only supported on Linux
    pub struct AffinityGuard;

    impl AffinityGuard {
        pub fn pin_current() -> Result<Self, &'static str> {
            Err("thread pinning is not supported on this platform")
        }
    }
}
