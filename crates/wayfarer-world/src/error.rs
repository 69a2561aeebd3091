//! Error types for world content.

use crate::LocationId;

/// Structural problems found in a location graph, typically one read
/// back from a damaged save file.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The graph's starting location is not in the arena.
    #[error("starting location {0} does not exist")]
    MissingStart(LocationId),

    /// An exit points outside the arena.
    #[error("exit {exit:?} of location {location} points to missing location {target}")]
    DanglingExit {
        location: LocationId,
        exit: String,
        target: LocationId,
    },
}
