use super::{ProbeSource, ReadStatus, SourceState};
use crate::core::{PacketShape, RawPacket};
use anyhow::{anyhow, Result};
use tracing::warn;

/// Owns one hardware session and guarantees it is closed exactly once,
/// whether through `close()` or on drop.
pub struct Session<S: ProbeSource> {
    inner: S,
    state: SourceState,
}

impl<S: ProbeSource> Session<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: source,
            state: SourceState::Unopened,
        }
    }

    pub fn packet_shape(&self) -> PacketShape {
        self.inner.packet_shape()
    }

    pub fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot open session in state {:?}", self.state));
        }
        self.inner.open()?;
        self.state = SourceState::Opened;
        Ok(())
    }

    pub fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus> {
        if self.state != SourceState::Opened {
            return Err(anyhow!("Cannot read in session state {:?}", self.state));
        }
        self.inner.read_packet(packet)
    }

    pub fn queue_fill_level(&mut self) -> Result<f32> {
        if self.state != SourceState::Opened {
            return Err(anyhow!("Cannot poll fill level in session state {:?}", self.state));
        }
        self.inner.queue_fill_level()
    }

    /// Close the underlying source. Later calls (and drop) are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.state == SourceState::Closed {
            return Ok(());
        }
        // Closed even if the source reports an error; it is never retried.
        self.state = SourceState::Closed;
        self.inner.close()
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }
}

impl<S: ProbeSource> Drop for Session<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close hardware session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::ScriptedSource;

    #[test]
    fn test_close_is_idempotent() {
        let source = ScriptedSource::new(PacketShape::new(2, 2));
        let counters = source.counters();
        let mut session = Session::new(source);

        session.open().unwrap();
        session.close().unwrap();
        session.close().unwrap();
        drop(session);

        assert_eq!(counters.closes(), 1);
    }

    #[test]
    fn test_drop_closes_unopened_session() {
        let source = ScriptedSource::new(PacketShape::new(2, 2));
        let counters = source.counters();
        drop(Session::new(source));

        assert_eq!(counters.opens(), 0);
        assert_eq!(counters.closes(), 1);
    }

    #[test]
    fn test_read_requires_open_session() {
        let shape = PacketShape::new(2, 2);
        let mut session = Session::new(ScriptedSource::new(shape));
        let mut packet = RawPacket::new(shape);

        assert!(session.read_packet(&mut packet).is_err());
    }
}
