//! Poll cycle orchestration

pub mod orchestrator;

pub use orchestrator::{Agent, CycleReport, PollState};
