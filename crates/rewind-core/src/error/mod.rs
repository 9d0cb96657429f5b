//! Error types for the checkpoint engine
//!
//! Every failure surfaced by the engine is a [`RewindError`]. Variants map onto
//! the failure classes the engine distinguishes:
//! - `NotFound`: unknown checkpoint id, raised before any side effect
//! - `Io`: a filesystem operation failed (usually recovered per path)
//! - `StoreCorruption`: a persisted checkpoint document failed to parse
//! - `GitUnavailable` / `GitCommandFailure`: degraded git integration
//!
//! All variants expose a stable error code through [`UnifiedError`].

mod constructors;
mod conversions;
mod types;
mod unified_error;

pub use types::{EngineResult, OptionExt, ResultExt, RewindError, UnifiedError};
