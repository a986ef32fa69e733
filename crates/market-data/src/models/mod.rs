//! Market data models
//!
//! - `asset` - Ranked assets tracked by the pipeline (TrackedAsset)
//! - `venue` - Ranked price sources, i.e. exchanges (PriceVenue)

mod asset;
mod venue;

pub use asset::TrackedAsset;
pub use venue::PriceVenue;
