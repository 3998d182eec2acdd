use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<EngineMetrics>,
}

/// Counter values at the moment of a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub frames: usize,
    pub emitted: usize,
    pub pruned: usize,
    pub rejected: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EngineMetrics::default()),
        }
    }

    pub fn record_frame(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += 1;
        }
    }

    pub fn record_emitted(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.emitted += count;
        }
    }

    pub fn record_pruned(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.pruned += count;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn snapshot(&self) -> EngineMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            EngineMetrics::default()
        }
    }

    pub fn reset(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            *metrics = EngineMetrics::default();
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
