use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for one executor. Shared by reference; all updates are atomic.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    tasks_completed: AtomicU64,
    tasks_failed: AtomicU64,
    gate_checks_passed: AtomicU64,
    gate_checks_failed: AtomicU64,
    total_task_micros: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Percentage of finished tasks that completed, 0.0 when none finished
    pub success_rate: f64,
    pub avg_task_ms: f64,
    pub total_task_ms: f64,
    pub gate_checks_passed: u64,
    pub gate_checks_failed: u64,
}

impl ExecutionMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_task(&self, duration: Duration, success: bool) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        self.total_task_micros.fetch_add(micros, Ordering::Relaxed);
        if success {
            self.tasks_completed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_gate_check(&self, passed: bool) {
        if passed {
            self.gate_checks_passed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.gate_checks_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn tasks_finished(&self) -> u64 {
        self.tasks_completed.load(Ordering::Relaxed) + self.tasks_failed.load(Ordering::Relaxed)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.tasks_completed.load(Ordering::Relaxed);
        let failed = self.tasks_failed.load(Ordering::Relaxed);
        let finished = completed + failed;
        let total_ms = self.total_task_micros.load(Ordering::Relaxed) as f64 / 1000.0;

        let (success_rate, avg_task_ms) = if finished == 0 {
            (0.0, 0.0)
        } else {
            (
                completed as f64 / finished as f64 * 100.0,
                total_ms / finished as f64,
            )
        };

        MetricsSnapshot {
            tasks_completed: completed,
            tasks_failed: failed,
            success_rate,
            avg_task_ms,
            total_task_ms: total_ms,
            gate_checks_passed: self.gate_checks_passed.load(Ordering::Relaxed),
            gate_checks_failed: self.gate_checks_failed.load(Ordering::Relaxed),
        }
    }
}
