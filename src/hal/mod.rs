pub mod file;
pub mod lifecycle;
pub mod mock;
pub mod traits;
pub mod types;

pub use file::{PacketFileError, PacketFileSource, PacketFileWriter};
pub use lifecycle::Session;
pub use traits::ProbeSource;
pub use types::{ReadStatus, SourceState};
