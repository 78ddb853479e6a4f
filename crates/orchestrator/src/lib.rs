//! Request orchestration: one canonical in-flight request per mode,
//! cache-first dispatch, and staleness-guarded notifications.
//!
//! The orchestrator consumes commands from the rendering collaborator,
//! consults the cache, calls the explanation backend on misses, and
//! reconciles out-of-order async completions by discarding anything that
//! resolves for a request id that is no longer current.

mod command;
mod error;
mod orchestrator;

pub use command::{Command, CommandResponse, ExplainOutcome};
pub use error::ExplainError;
pub use orchestrator::{Orchestrator, Settled};
