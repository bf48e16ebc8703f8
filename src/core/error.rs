use super::PacketShape;
use thiserror::Error;

/// A packet batch that violates the fixed probe geometry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeMismatch {
    #[error("cannot assemble a frame from an empty packet batch")]
    Empty,

    #[error("packet {index} has shape {found}, expected {expected}")]
    Packet {
        index: usize,
        expected: PacketShape,
        found: PacketShape,
    },
}

/// Fatal errors surfaced to the frame consumer.
///
/// End of stream and cancellation are not errors: the stream just completes.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatch),

    #[error("hardware read failed")]
    HardwareRead(#[source] anyhow::Error),

    #[error("failed to open hardware session")]
    Open(#[source] anyhow::Error),

    #[error("invalid acquisition config: {0}")]
    InvalidConfig(String),

    #[error("failed to start acquisition worker")]
    Spawn(#[source] std::io::Error),

    #[error("acquisition worker panicked: {0}")]
    WorkerPanicked(String),
}

impl AcquisitionError {
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, Self::ShapeMismatch(_))
    }

    pub fn is_hardware_read(&self) -> bool {
        matches!(self, Self::HardwareRead(_))
    }
}
