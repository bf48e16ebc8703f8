pub mod assembler;
pub mod error;
pub mod frame;
pub mod packet;

pub use assembler::FrameAssembler;
pub use error::{AcquisitionError, ShapeMismatch};
pub use frame::{Frame, Matrix};
pub use packet::{PacketShape, RawPacket};
