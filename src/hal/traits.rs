use anyhow::Result;
use super::types::ReadStatus;
use crate::core::{PacketShape, RawPacket};

/// Hardware access collaborator driven by the acquisition loop.
///
/// All calls are blocking and made from the single acquisition worker.
pub trait ProbeSource: Send {
    /// Geometry of every packet this source produces
    fn packet_shape(&self) -> PacketShape;

    /// Open the hardware session and arm it for streaming
    fn open(&mut self) -> Result<()>;

    /// Block until one packet has been written into `packet`, or report end of stream
    fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus>;

    /// Instantaneous input queue fill fraction (0-1), cheap to call
    fn queue_fill_level(&mut self) -> Result<f32>;

    /// Release the session. Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;
}

impl<S: ProbeSource + ?Sized> ProbeSource for Box<S> {
    fn packet_shape(&self) -> PacketShape {
        (**self).packet_shape()
    }

    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus> {
        (**self).read_packet(packet)
    }

    fn queue_fill_level(&mut self) -> Result<f32> {
        (**self).queue_fill_level()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
