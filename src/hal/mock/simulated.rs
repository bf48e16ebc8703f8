use crate::core::{PacketShape, RawPacket};
use crate::hal::{ProbeSource, ReadStatus, SourceState};
use anyhow::{anyhow, Result};
use serde_json::Value;
use std::f64::consts::PI;

// Fill level ramps over this many packets, then the simulated FIFO drains
const QUEUE_DEPTH: u64 = 64;

/// Synthetic probe producing plausible packets on demand.
///
/// Counters carry the running sample index, the sync line toggles at 1 Hz,
/// AP channels carry phase-shifted sinusoids and the LFP sample is a slow
/// oscillation shared by all channels.
pub struct SimulatedProbe {
    state: SourceState,
    shape: PacketShape,
    sample_rate: f64,
    ap_frequency: f64,
    lfp_frequency: f64,
    amplitude: f64,
    packet_limit: Option<u64>,
    packets_read: u64,
}

impl SimulatedProbe {
    pub fn new() -> Self {
        Self {
            state: SourceState::Unopened,
            shape: PacketShape::NEUROPIX_3A,
            sample_rate: 30000.0,
            ap_frequency: 1000.0,
            lfp_frequency: 2.0,
            amplitude: 100.0,
            packet_limit: None,
            packets_read: 0,
        }
    }

    pub fn with_shape(mut self, shape: PacketShape) -> Self {
        self.shape = shape;
        self
    }

    /// Report end of stream after `limit` packets
    pub fn with_packet_limit(mut self, limit: u64) -> Self {
        self.packet_limit = Some(limit);
        self
    }

    pub fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot configure device in state {:?}", self.state));
        }

        if let Some(samples) = config["samples"].as_u64() {
            self.shape.samples = usize::try_from(samples)?;
        }
        if let Some(channels) = config["channels"].as_u64() {
            self.shape.channels = usize::try_from(channels)?;
        }
        if let Some(sr) = config["sample_rate"].as_f64() {
            self.sample_rate = sr;
        }
        if let Some(freq) = config["ap_frequency"].as_f64() {
            self.ap_frequency = freq;
        }
        if let Some(freq) = config["lfp_frequency"].as_f64() {
            self.lfp_frequency = freq;
        }
        if let Some(amp) = config["amplitude"].as_f64() {
            self.amplitude = amp;
        }
        if let Some(limit) = config["packet_limit"].as_u64() {
            self.packet_limit = Some(limit);
        }

        if self.shape.is_empty() {
            return Err(anyhow!("Simulated probe needs at least one sample and one channel"));
        }
        if self.shape.checked_frame_len(1).is_none() {
            return Err(anyhow!("Simulated probe shape {} is too large", self.shape));
        }
        if self.sample_rate <= 0.0 {
            return Err(anyhow!("Sample rate must be positive, got {}", self.sample_rate));
        }

        Ok(())
    }

    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    fn fill(&self, packet: &mut RawPacket) {
        let s = self.shape.samples;
        let c = self.shape.channels;
        let columns = self.shape.counter_columns();
        let first_sample = self.packets_read * s as u64;
        let half_period = (self.sample_rate / 2.0).max(1.0) as u64;

        for r in 0..s {
            let sample_index = first_sample + r as u64;
            let t = sample_index as f64 / self.sample_rate;

            packet.start_trigger_mut()[r] = u8::from(sample_index == 0);
            packet.synchronization_mut()[r] = ((sample_index / half_period) % 2) as u16;

            let row = &mut packet.counters_mut()[r * columns..(r + 1) * columns];
            for value in row[..s].iter_mut() {
                *value = sample_index as i32;
            }
            row[s] = 0;

            let ap_row = &mut packet.ap_data_mut()[r * c..(r + 1) * c];
            for (ch, value) in ap_row.iter_mut().enumerate() {
                let phase = 2.0 * PI * ch as f64 / c as f64;
                *value = (self.amplitude * (2.0 * PI * self.ap_frequency * t + phase).sin()) as f32;
            }
        }

        let t = first_sample as f64 / self.sample_rate;
        let lfp = (0.5 * self.amplitude * (2.0 * PI * self.lfp_frequency * t).sin()) as f32;
        packet.lfp_data_mut().fill(lfp);
    }
}

impl Default for SimulatedProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeSource for SimulatedProbe {
    fn packet_shape(&self) -> PacketShape {
        self.shape
    }

    fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot open device in state {:?}", self.state));
        }
        self.state = SourceState::Opened;
        self.packets_read = 0;
        Ok(())
    }

    fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus> {
        if self.state != SourceState::Opened {
            return Err(anyhow!("Device not running"));
        }
        if packet.shape() != self.shape {
            *packet = RawPacket::new(self.shape);
        }
        if self.packet_limit.is_some_and(|limit| self.packets_read >= limit) {
            return Ok(ReadStatus::EndOfStream);
        }

        self.fill(packet);
        self.packets_read += 1;
        Ok(ReadStatus::Filled)
    }

    fn queue_fill_level(&mut self) -> Result<f32> {
        Ok((self.packets_read % QUEUE_DEPTH) as f32 / QUEUE_DEPTH as f32)
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counters_carry_sample_index() {
        let shape = PacketShape::new(4, 3);
        let mut probe = SimulatedProbe::new().with_shape(shape);
        probe.open().unwrap();

        let mut packet = RawPacket::new(shape);
        probe.read_packet(&mut packet).unwrap();
        probe.read_packet(&mut packet).unwrap();

        assert_eq!(packet.counter(0, 0), 4);
        assert_eq!(packet.counter(3, 2), 7);
        assert_eq!(packet.counter(3, 4), 0);
        assert_eq!(packet.start_trigger(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_configure_rejects_empty_shape() {
        let mut probe = SimulatedProbe::new();
        assert!(probe.configure(json!({"channels": 0})).is_err());
    }

    #[test]
    fn test_configure_rejects_oversized_shape() {
        let mut probe = SimulatedProbe::new();
        assert!(probe.configure(json!({"samples": u64::MAX, "channels": 4})).is_err());
    }
}
