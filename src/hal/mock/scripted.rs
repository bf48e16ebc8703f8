use crate::core::{PacketShape, RawPacket};
use crate::hal::{ProbeSource, ReadStatus, SourceState};
use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One scripted response to `read_packet`
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Packet(RawPacket),
    EndOfStream,
    Fail(String),
}

/// Call counters shared with the test that owns the source
#[derive(Debug, Default)]
pub struct SourceCounters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    reads: AtomicUsize,
    fill_polls: AtomicUsize,
}

impl SourceCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fill_polls(&self) -> usize {
        self.fill_polls.load(Ordering::SeqCst)
    }
}

/// Deterministic hardware double: replays a fixed script of packets,
/// end-of-stream markers and read failures.
pub struct ScriptedSource {
    shape: PacketShape,
    steps: VecDeque<ScriptStep>,
    repeat: Option<RawPacket>,
    fill_level: f32,
    read_delay: Option<Duration>,
    open_failure: Option<String>,
    counters: Arc<SourceCounters>,
    state: SourceState,
}

impl ScriptedSource {
    pub fn new(shape: PacketShape) -> Self {
        Self {
            shape,
            steps: VecDeque::new(),
            repeat: None,
            fill_level: 0.0,
            read_delay: None,
            open_failure: None,
            counters: Arc::new(SourceCounters::default()),
            state: SourceState::Unopened,
        }
    }

    pub fn with_packets(mut self, packets: impl IntoIterator<Item = RawPacket>) -> Self {
        self.steps.extend(packets.into_iter().map(ScriptStep::Packet));
        self
    }

    pub fn then(mut self, step: ScriptStep) -> Self {
        self.steps.push_back(step);
        self
    }

    /// Once the script runs out, keep delivering copies of `packet` forever
    pub fn repeat_forever(mut self, packet: RawPacket) -> Self {
        self.repeat = Some(packet);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn with_fill_level(mut self, level: f32) -> Self {
        self.fill_level = level;
        self
    }

    pub fn fail_on_open(mut self, message: impl Into<String>) -> Self {
        self.open_failure = Some(message.into());
        self
    }

    pub fn counters(&self) -> Arc<SourceCounters> {
        self.counters.clone()
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }
}

impl ProbeSource for ScriptedSource {
    fn packet_shape(&self) -> PacketShape {
        self.shape
    }

    fn open(&mut self) -> Result<()> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.open_failure {
            return Err(anyhow!("{}", message));
        }
        self.state = SourceState::Opened;
        Ok(())
    }

    fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus> {
        if self.state != SourceState::Opened {
            return Err(anyhow!("Device not opened"));
        }
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        self.counters.reads.fetch_add(1, Ordering::SeqCst);

        match self.steps.pop_front() {
            Some(ScriptStep::Packet(next)) => {
                packet.clone_from(&next);
                Ok(ReadStatus::Filled)
            }
            Some(ScriptStep::EndOfStream) => Ok(ReadStatus::EndOfStream),
            Some(ScriptStep::Fail(message)) => Err(anyhow!("{}", message)),
            None => match &self.repeat {
                Some(next) => {
                    packet.clone_from(next);
                    Ok(ReadStatus::Filled)
                }
                None => Ok(ReadStatus::EndOfStream),
            },
        }
    }

    fn queue_fill_level(&mut self) -> Result<f32> {
        self.counters.fill_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fill_level)
    }

    fn close(&mut self) -> Result<()> {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
        self.state = SourceState::Closed;
        Ok(())
    }
}
