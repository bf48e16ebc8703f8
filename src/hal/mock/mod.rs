pub mod scripted;
pub mod simulated;

pub use scripted::{ScriptStep, ScriptedSource, SourceCounters};
pub use simulated::SimulatedProbe;
