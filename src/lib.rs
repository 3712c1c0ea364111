//! A traffic simulation of a single multi-lane road segment.
//!
//! Vehicles enter at the start of the road, follow the vehicle ahead of them
//! in every lane they occupy, and change into an adjacent lane when they are
//! held up and there is room beside them.

pub use cgmath;
pub use error::{RoadError, RoadResult};
pub use lane::{Direction, LaneRange};
pub use road::Road;
pub use signal::{Signal, SignalState};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;
pub use vehicle::{Vehicle, VehicleAttributes};

mod entry;
mod error;
mod lane;
mod lane_change;
pub mod math;
mod obstacle;
mod road;
mod signal;
mod util;
mod vehicle;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
