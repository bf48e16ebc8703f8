use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed dimensions of one raw packet: `samples` (S) per block and `channels` (C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PacketShape {
    pub samples: usize,
    pub channels: usize,
}

impl PacketShape {
    /// Phase 3A probe: 12 samples per packet, 384 recording channels
    pub const NEUROPIX_3A: PacketShape = PacketShape {
        samples: 12,
        channels: 384,
    };

    pub const fn new(samples: usize, channels: usize) -> Self {
        Self { samples, channels }
    }

    /// Columns of the per-packet counter block (one per sample plus a status column)
    pub const fn counter_columns(&self) -> usize {
        self.samples + 1
    }

    pub const fn counter_len(&self) -> usize {
        self.samples * self.counter_columns()
    }

    pub const fn ap_len(&self) -> usize {
        self.samples * self.channels
    }

    pub const fn is_empty(&self) -> bool {
        self.samples == 0 || self.channels == 0
    }

    /// Elements in the largest per-sample matrix of a frame batching
    /// `packets` packets, or `None` if that matrix cannot be allocated.
    pub fn checked_frame_len(&self, packets: usize) -> Option<usize> {
        let rows = self.channels.max(self.samples.checked_add(1)?);
        let len = self.samples.checked_mul(packets)?.checked_mul(rows)?;
        (len <= isize::MAX as usize / std::mem::size_of::<f32>()).then_some(len)
    }
}

impl Default for PacketShape {
    fn default() -> Self {
        Self::NEUROPIX_3A
    }
}

impl fmt::Display for PacketShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.samples, self.channels)
    }
}

/// One packet as delivered by the probe hardware.
///
/// Buffers are allocated once from the shape and overwritten in place by
/// every read, so their lengths never change after construction. Two-
/// dimensional blocks are stored row-major with one row per sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPacket {
    shape: PacketShape,
    start_trigger: Vec<u8>,
    synchronization: Vec<u16>,
    counters: Vec<i32>,
    lfp_data: Vec<f32>,
    ap_data: Vec<f32>,
}

impl RawPacket {
    pub fn new(shape: PacketShape) -> Self {
        Self {
            shape,
            start_trigger: vec![0u8; shape.samples],
            synchronization: vec![0u16; shape.samples],
            counters: vec![0i32; shape.counter_len()],
            lfp_data: vec![0.0f32; shape.channels],
            ap_data: vec![0.0f32; shape.ap_len()],
        }
    }

    pub fn shape(&self) -> PacketShape {
        self.shape
    }

    pub fn start_trigger(&self) -> &[u8] {
        &self.start_trigger
    }

    pub fn start_trigger_mut(&mut self) -> &mut [u8] {
        &mut self.start_trigger
    }

    pub fn synchronization(&self) -> &[u16] {
        &self.synchronization
    }

    pub fn synchronization_mut(&mut self) -> &mut [u16] {
        &mut self.synchronization
    }

    /// S rows by S+1 columns
    pub fn counters(&self) -> &[i32] {
        &self.counters
    }

    pub fn counters_mut(&mut self) -> &mut [i32] {
        &mut self.counters
    }

    /// One low-frequency sample per channel, shared by the whole packet
    pub fn lfp_data(&self) -> &[f32] {
        &self.lfp_data
    }

    pub fn lfp_data_mut(&mut self) -> &mut [f32] {
        &mut self.lfp_data
    }

    /// S rows (samples) by C columns (channels)
    pub fn ap_data(&self) -> &[f32] {
        &self.ap_data
    }

    pub fn ap_data_mut(&mut self) -> &mut [f32] {
        &mut self.ap_data
    }

    pub fn counter(&self, sample: usize, column: usize) -> i32 {
        self.counters[sample * self.shape.counter_columns() + column]
    }

    pub fn ap(&self, sample: usize, channel: usize) -> f32 {
        self.ap_data[sample * self.shape.channels + channel]
    }
}
