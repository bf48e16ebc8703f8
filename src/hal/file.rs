use super::{ProbeSource, ReadStatus, SourceState};
use crate::core::{PacketShape, RawPacket};
use anyhow::{anyhow, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

const MAGIC: &[u8; 4] = b"NPXP";
const VERSION: u16 = 1;

/// Bytes before the first packet record
pub const HEADER_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum PacketFileError {
    #[error("packet file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("not a packet capture file (bad magic or truncated header)")]
    BadMagic,

    #[error("unsupported packet file version {0}")]
    UnsupportedVersion(u16),

    #[error("packet file declares an empty shape {0}")]
    EmptyShape(PacketShape),

    #[error("packet shape {found} does not match file shape {expected}")]
    ShapeMismatch {
        expected: PacketShape,
        found: PacketShape,
    },
}

/// Size in bytes of one encoded packet record
pub fn record_len(shape: PacketShape) -> usize {
    shape.samples
        + 2 * shape.samples
        + 4 * shape.counter_len()
        + 4 * shape.channels
        + 4 * shape.ap_len()
}

/// Replays a capture file of fixed-size little-endian packet records.
///
/// The file is memory-mapped read-only; its end is reported as end of stream.
pub struct PacketFileSource {
    path: PathBuf,
    mmap: Mmap,
    shape: PacketShape,
    record_count: usize,
    cursor: usize,
    state: SourceState,
}

impl PacketFileSource {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, PacketFileError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        // Capture files are written once and only read while mapped.
        let mmap = unsafe { Mmap::map(&file)? };

        let shape = parse_header(&mmap)?;
        let record_count = (mmap.len() - HEADER_LEN) / record_len(shape);
        debug!(path = %path.display(), %shape, records = record_count, "mapped packet file");

        Ok(Self {
            path,
            mmap,
            shape,
            record_count,
            cursor: 0,
            state: SourceState::Unopened,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    fn trailing_bytes(&self) -> usize {
        (self.mmap.len() - HEADER_LEN) % record_len(self.shape)
    }
}

impl ProbeSource for PacketFileSource {
    fn packet_shape(&self) -> PacketShape {
        self.shape
    }

    fn open(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot open packet file in state {:?}", self.state));
        }
        self.cursor = 0;
        self.state = SourceState::Opened;
        Ok(())
    }

    fn read_packet(&mut self, packet: &mut RawPacket) -> Result<ReadStatus> {
        if self.state != SourceState::Opened {
            return Err(anyhow!("Packet file not opened"));
        }
        if self.cursor >= self.record_count {
            let trailing = self.trailing_bytes();
            if trailing > 0 {
                warn!(path = %self.path.display(), trailing, "ignoring truncated packet record");
            }
            return Ok(ReadStatus::EndOfStream);
        }
        if packet.shape() != self.shape {
            *packet = RawPacket::new(self.shape);
        }

        let len = record_len(self.shape);
        let start = HEADER_LEN + self.cursor * len;
        decode_record(&self.mmap[start..start + len], packet);
        self.cursor += 1;
        Ok(ReadStatus::Filled)
    }

    fn queue_fill_level(&mut self) -> Result<f32> {
        if self.record_count == 0 {
            return Ok(0.0);
        }
        let remaining = self.record_count.saturating_sub(self.cursor);
        Ok(remaining as f32 / self.record_count as f32)
    }

    fn close(&mut self) -> Result<()> {
        self.state = SourceState::Closed;
        Ok(())
    }
}

/// Writes packets in the capture format read by [`PacketFileSource`]
pub struct PacketFileWriter<W: Write> {
    inner: W,
    shape: PacketShape,
    packets_written: u64,
}

impl<W: Write> PacketFileWriter<W> {
    pub fn new(mut inner: W, shape: PacketShape) -> Result<Self, PacketFileError> {
        if shape.is_empty() {
            return Err(PacketFileError::EmptyShape(shape));
        }
        inner.write_all(MAGIC)?;
        inner.write_all(&VERSION.to_le_bytes())?;
        inner.write_all(&(shape.samples as u16).to_le_bytes())?;
        inner.write_all(&(shape.channels as u16).to_le_bytes())?;
        inner.write_all(&0u16.to_le_bytes())?;

        Ok(Self {
            inner,
            shape,
            packets_written: 0,
        })
    }

    pub fn write_packet(&mut self, packet: &RawPacket) -> Result<(), PacketFileError> {
        if packet.shape() != self.shape {
            return Err(PacketFileError::ShapeMismatch {
                expected: self.shape,
                found: packet.shape(),
            });
        }

        let mut record = Vec::with_capacity(record_len(self.shape));
        record.extend_from_slice(packet.start_trigger());
        for v in packet.synchronization() {
            record.extend_from_slice(&v.to_le_bytes());
        }
        for v in packet.counters() {
            record.extend_from_slice(&v.to_le_bytes());
        }
        for v in packet.lfp_data() {
            record.extend_from_slice(&v.to_le_bytes());
        }
        for v in packet.ap_data() {
            record.extend_from_slice(&v.to_le_bytes());
        }
        self.inner.write_all(&record)?;
        self.packets_written += 1;
        Ok(())
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    pub fn finish(mut self) -> Result<W, PacketFileError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn parse_header(bytes: &[u8]) -> Result<PacketShape, PacketFileError> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(PacketFileError::BadMagic);
    }
    let field = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

    let version = field(4);
    if version != VERSION {
        return Err(PacketFileError::UnsupportedVersion(version));
    }
    let shape = PacketShape::new(field(6) as usize, field(8) as usize);
    if shape.is_empty() {
        return Err(PacketFileError::EmptyShape(shape));
    }
    Ok(shape)
}

fn decode_record(record: &[u8], packet: &mut RawPacket) {
    let shape = packet.shape();
    let (trigger, rest) = record.split_at(shape.samples);
    let (sync, rest) = rest.split_at(2 * shape.samples);
    let (counters, rest) = rest.split_at(4 * shape.counter_len());
    let (lfp, ap) = rest.split_at(4 * shape.channels);

    packet.start_trigger_mut().copy_from_slice(trigger);
    for (dst, b) in packet.synchronization_mut().iter_mut().zip(sync.chunks_exact(2)) {
        *dst = u16::from_le_bytes([b[0], b[1]]);
    }
    for (dst, b) in packet.counters_mut().iter_mut().zip(counters.chunks_exact(4)) {
        *dst = i32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
    for (dst, b) in packet.lfp_data_mut().iter_mut().zip(lfp.chunks_exact(4)) {
        *dst = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
    for (dst, b) in packet.ap_data_mut().iter_mut().zip(ap.chunks_exact(4)) {
        *dst = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_len_reference_shape() {
        // 12 + 24 + 624 + 1536 + 18432
        assert_eq!(record_len(PacketShape::NEUROPIX_3A), 20628);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let bytes = b"WAVE\x01\x00\x02\x00\x02\x00\x00\x00";
        assert!(matches!(parse_header(bytes), Err(PacketFileError::BadMagic)));
    }

    #[test]
    fn test_header_rejects_unknown_version() {
        let bytes = b"NPXP\x07\x00\x02\x00\x02\x00\x00\x00";
        assert!(matches!(
            parse_header(bytes),
            Err(PacketFileError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn test_writer_header_parses_back() {
        let shape = PacketShape::new(2, 5);
        let bytes = PacketFileWriter::new(Vec::new(), shape).unwrap().finish().unwrap();

        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(parse_header(&bytes).unwrap(), shape);
    }
}
