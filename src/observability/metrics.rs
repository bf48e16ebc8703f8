use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters updated by the acquisition worker, readable from any thread
pub struct AcquisitionMetrics {
    frames_emitted: AtomicU64,
    packets_read: AtomicU64,
    overruns: AtomicU64,
    capacity_polls: AtomicU64,
    total_cycle_us: AtomicU64,
    cycle_samples: AtomicU64,
    // f32 bit pattern
    buffer_capacity: AtomicU32,
}

/// Point-in-time copy of [`AcquisitionMetrics`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_emitted: u64,
    pub packets_read: u64,
    pub overruns: u64,
    pub capacity_polls: u64,
    pub avg_cycle_us: u64,
    pub buffer_capacity: f32,
}

impl AcquisitionMetrics {
    pub fn new() -> Self {
        Self {
            frames_emitted: AtomicU64::new(0),
            packets_read: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            capacity_polls: AtomicU64::new(0),
            total_cycle_us: AtomicU64::new(0),
            cycle_samples: AtomicU64::new(0),
            buffer_capacity: AtomicU32::new(0f32.to_bits()),
        }
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted.load(Ordering::Relaxed)
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read.load(Ordering::Relaxed)
    }

    /// Cycles whose processing alone exceeded the pacing budget
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    pub fn capacity_polls(&self) -> u64 {
        self.capacity_polls.load(Ordering::Relaxed)
    }

    /// Last polled hardware queue fill fraction
    pub fn buffer_capacity(&self) -> f32 {
        f32::from_bits(self.buffer_capacity.load(Ordering::Relaxed))
    }

    pub fn record_packets_read(&self, count: usize) {
        self.packets_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_frame_emitted(&self) {
        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity(&self, capacity: f32) {
        self.capacity_polls.fetch_add(1, Ordering::Relaxed);
        self.buffer_capacity.store(capacity.to_bits(), Ordering::Relaxed);
    }

    pub fn start_cycle(&self) -> Instant {
        Instant::now()
    }

    /// Record the busy part of a cycle (reads, assembly, emission)
    pub fn finish_cycle(&self, start: Instant) -> Duration {
        let elapsed = start.elapsed();
        self.total_cycle_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.cycle_samples.fetch_add(1, Ordering::Relaxed);
        elapsed
    }

    pub fn avg_cycle_us(&self) -> u64 {
        let samples = self.cycle_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_cycle_us.load(Ordering::Relaxed) / samples
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_emitted: self.frames_emitted(),
            packets_read: self.packets_read(),
            overruns: self.overruns(),
            capacity_polls: self.capacity_polls(),
            avg_cycle_us: self.avg_cycle_us(),
            buffer_capacity: self.buffer_capacity(),
        }
    }
}

impl Default for AcquisitionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
