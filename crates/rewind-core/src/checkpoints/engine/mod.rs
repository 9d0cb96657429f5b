//! Checkpoint engine
//!
//! The engine is the single entry point for capture, listing, rewind and
//! merge. It is constructed once per workspace and passed by reference to
//! whoever needs it; nothing is fetched from global state.
//!
//! The engine does no cross-call locking. Hosts must serialize capture and
//! rewind calls against one workspace.

mod capture;
mod operations;
mod rewind;
mod types;

pub use types::CheckpointEngine;
