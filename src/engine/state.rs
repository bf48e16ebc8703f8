use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

/// Acquisition session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AcquisitionState {
    /// No hardware session held
    Idle = 0,
    /// Session opened, not yet reading
    Armed = 1,
    /// Reading, assembling, emitting and pacing
    Running = 2,
    /// Device reported end of stream
    Draining = 3,
    /// Caller requested stop
    Cancelled = 4,
    /// Open, read or assembly failed
    Faulted = 5,
    /// Session released
    Closed = 6,
}

impl AcquisitionState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &AcquisitionState) -> bool {
        use AcquisitionState::*;

        matches!(
            (self, target),
            (Idle, Armed) |
            (Idle, Faulted) |

            (Armed, Running) |
            (Armed, Cancelled) |
            (Armed, Faulted) |

            (Running, Draining) |
            (Running, Cancelled) |
            (Running, Faulted) |

            (Draining, Closed) |
            (Cancelled, Closed) |
            (Faulted, Closed)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Armed => "Armed",
            Self::Running => "Running",
            Self::Draining => "Draining",
            Self::Cancelled => "Cancelled",
            Self::Faulted => "Faulted",
            Self::Closed => "Closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        *self == Self::Closed
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Armed,
            2 => Self::Running,
            3 => Self::Draining,
            4 => Self::Cancelled,
            5 => Self::Faulted,
            _ => Self::Closed,
        }
    }
}

impl Default for AcquisitionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// State written by the acquisition worker and readable from any thread
#[derive(Debug, Default)]
pub struct SharedState(AtomicU8);

impl SharedState {
    pub fn new() -> Self {
        Self(AtomicU8::new(AcquisitionState::Idle as u8))
    }

    pub fn get(&self) -> AcquisitionState {
        AcquisitionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the transition is valid; returns whether it happened
    pub fn advance(&self, next: AcquisitionState) -> bool {
        let current = self.get();
        if !current.can_transition_to(&next) {
            debug!(from = current.name(), to = next.name(), "ignored invalid state transition");
            return false;
        }
        self.0.store(next as u8, Ordering::Release);
        debug!(from = current.name(), to = next.name(), "acquisition state changed");
        true
    }
}
