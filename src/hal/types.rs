use serde::{Deserialize, Serialize};

/// Outcome of one packet read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The packet buffer now holds a fresh packet
    Filled,
    /// The device has no more data (unplugged, end of playback file)
    EndOfStream,
}

/// Session state of a hardware source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceState {
    Unopened,
    Opened,
    Closed,
}

impl Default for SourceState {
    fn default() -> Self {
        SourceState::Unopened
    }
}
