//! Position Reduction Library - Core Algorithms for Rendering Large GPS Tracks
//!
//! This library decides which positions of a potentially huge ordered position list are
//! worth handing to a map view, and turns arbitrary sets of changed list indices into
//! minimal batches of contiguous ranges for table and overlay observers.
//!
//! # Architecture
//!
//! - **[`range`]**: Compaction of index sets into continuous ranges and the two-level
//!   [`RangeOperation`] callback driven over them
//! - **[`filter`]**: Stateless reduction policies (every Nth, visible, significant, selected)
//! - **[`PositionReducer`]**: Zoom-aware reduction pipeline backed by a [`BoundsProvider`]
//! - **[`NavigationPosition`]**: Read-only coordinate access implemented for [`Position`],
//!   `gpx::Waypoint` and `geo::Point`
//!
//! # Performance Characteristics
//!
//! - **Compaction**: O(N log N) sort plus a single linear pass
//! - **Every Nth / visible filters**: O(N), single pass
//! - **Significance filter**: O(N log N) typical, O(N²) worst case (Douglas-Peucker)

mod bounds;
pub mod filter;
mod position;
pub mod range;
mod reducer;
pub mod utils;

// Public API exports
pub use bounds::{BoundingBox, BoundsProvider, StaticBounds};
pub use position::{NavigationPosition, Position};
pub use range::{PerformOutcome, RangeOperation, Traversal};
pub use reducer::{PositionReducer, ReducerConfig, RouteCharacteristics};

/// Error types for reduction and compaction
#[derive(Debug, thiserror::Error)]
pub enum ReductionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Bounds provider failed: {0}")]
    Callback(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ReductionError {
    /// Wrap a failure reported by a [`BoundsProvider`] implementation
    pub fn callback(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ReductionError::Callback(error.into())
    }
}

pub type Result<T> = std::result::Result<T, ReductionError>;
