use super::{Frame, Matrix, PacketShape, RawPacket, ShapeMismatch};

/// Transcodes raw packets into channel-major frames.
///
/// Pure transformation: every value is copied out of the packet buffers, so
/// the caller is free to overwrite them as soon as `assemble` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameAssembler {
    shape: PacketShape,
}

impl FrameAssembler {
    pub fn new(shape: PacketShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> PacketShape {
        self.shape
    }

    /// Build one frame from a non-empty batch of packets.
    ///
    /// Packet `i` lands at columns `[i*S, (i+1)*S)` of the per-sample matrices
    /// (counters and AP data transposed, trigger and sync copied) and at
    /// column `i` of the LFP matrix. `capacity` is passed through unchanged.
    pub fn assemble(&self, packets: &[RawPacket], capacity: f32) -> Result<Frame, ShapeMismatch> {
        self.check(packets)?;

        let s = self.shape.samples;
        let c = self.shape.channels;
        let k = packets.len();
        let columns = s * k;

        let mut start_trigger = Matrix::zeros(1, columns);
        let mut synchronization = Matrix::zeros(1, columns);
        let mut counters = Matrix::zeros(self.shape.counter_columns(), columns);
        let mut lfp_data = Matrix::zeros(c, k);
        let mut ap_data = Matrix::zeros(c, columns);

        for (i, packet) in packets.iter().enumerate() {
            let offset = i * s;
            start_trigger.put_row(0, offset, packet.start_trigger());
            synchronization.put_row(0, offset, packet.synchronization());
            counters.put_transposed(packet.counters(), s, self.shape.counter_columns(), offset);
            lfp_data.put_column(i, packet.lfp_data());
            ap_data.put_transposed(packet.ap_data(), s, c, offset);
        }

        Ok(Frame {
            sequence_id: 0,
            start_trigger,
            synchronization,
            counters,
            lfp_data,
            ap_data,
            buffer_capacity: capacity,
        })
    }

    fn check(&self, packets: &[RawPacket]) -> Result<(), ShapeMismatch> {
        if packets.is_empty() {
            return Err(ShapeMismatch::Empty);
        }

        match packets
            .iter()
            .enumerate()
            .find(|(_, packet)| packet.shape() != self.shape)
        {
            Some((index, packet)) => Err(ShapeMismatch::Packet {
                index,
                expected: self.shape,
                found: packet.shape(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new(PacketShape::NEUROPIX_3A)
    }
}
