pub mod acquisition;
pub mod cancel;
pub mod config;
pub mod pacing;
pub mod state;

pub use acquisition::{
    Acquisition, AcquisitionLoop, ExitReason, FrameResult, FrameStream, SessionReport,
};
pub use cancel::CancelToken;
pub use config::AcquisitionConfig;
pub use pacing::Pacer;
pub use state::{AcquisitionState, SharedState};
