//! Pure grid geometry: window columns, resource rows, placements and overlap flags.
//! Nothing in here mutates chart state.

mod blocks;
mod conflict;
mod focus;
mod placement;
mod resources;
mod stats;
mod window;

pub use blocks::{block_placements, blocked_columns, BlockPlacement};
pub use conflict::{annotate, conflicting_ids};
pub use focus::{FocusStep, FocusedCell};
pub use placement::{place, placements, IntervalFilter, Placement};
pub use resources::{natural_cmp, occupied_resources, ResourceFilter, ResourceIndex};
pub use stats::{daily_movements, occupancy, DailyMovements, Occupancy};
pub use window::{Column, TimelineWindow, ViewScale};
