use crate::core::{PacketShape, RawPacket};

/// Fixed set of packet buffers reused for every read batch.
///
/// Allocated once per acquisition; reads overwrite the buffers in place and
/// frames copy their data out before the next batch begins.
pub struct PacketBatch {
    packets: Vec<RawPacket>,
}

impl PacketBatch {
    pub fn new(shape: PacketShape, size: usize) -> Self {
        Self {
            packets: (0..size).map(|_| RawPacket::new(shape)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn packets(&self) -> &[RawPacket] {
        &self.packets
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RawPacket> {
        self.packets.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_buffers_are_reused() {
        let shape = PacketShape::new(2, 2);
        let mut batch = PacketBatch::new(shape, 3);
        let before: Vec<*const f32> = batch.packets().iter().map(|p| p.ap_data().as_ptr()).collect();

        for packet in batch.iter_mut() {
            packet.ap_data_mut().fill(1.0);
        }

        let after: Vec<*const f32> = batch.packets().iter().map(|p| p.ap_data().as_ptr()).collect();
        assert_eq!(before, after);
        assert_eq!(batch.len(), 3);
    }
}
