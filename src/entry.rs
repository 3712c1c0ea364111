//! Choosing where a new vehicle enters the road.

use crate::lane::{LaneRange, LaneTable};
use crate::math::lanes_required;
use crate::{RoadError, RoadResult, VehicleSet};

/// Where a new vehicle should be placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct EntryPlan {
    /// The lanes the vehicle will occupy.
    pub lanes: LaneRange,
    /// The longitudinal position of the front of the vehicle in m.
    pub pos: f64,
    /// The lateral position of the vehicle from the bottom edge of the road in m.
    pub lat: f64,
}

/// Finds the lane group with the most free space behind the start of the road
/// for a vehicle `width` m wide.
///
/// Every group of adjacent lanes wide enough for the vehicle is a candidate.
/// The vehicle enters behind the rearmost vehicle in its group, but never
/// ahead of the start of the road. The group letting it enter furthest forward
/// wins, with ties going to the leftmost group.
pub(crate) fn plan_entry(
    lanes: Option<&LaneTable>,
    vehicles: &VehicleSet,
    road_width: f64,
    width: f64,
) -> RoadResult<EntryPlan> {
    let lanes = lanes.ok_or(RoadError::LanesUninitialized)?;
    let lane_count = lanes.len();
    let lane_width = road_width / lane_count as f64;
    let required = lanes_required(width, lane_width);
    if required > lane_count {
        return Err(RoadError::VehicleTooWide {
            required,
            available: lane_count,
        });
    }

    let back_ends = lanes.back_ends(vehicles);
    let mut best: Option<(usize, f64)> = None;
    for lo in 0..=(lane_count - required) {
        let back = back_ends[lo..lo + required]
            .iter()
            .copied()
            .fold(0.0, f64::min);
        if best.map_or(true, |(_, best_back)| back > best_back) {
            best = Some((lo, back));
            if back == 0.0 {
                break;
            }
        }
    }

    // There is always at least one candidate group
    let (lo, pos) = best.ok_or_else(|| {
        RoadError::InvariantViolation("no lane group could be considered".into())
    })?;
    Ok(EntryPlan {
        lanes: LaneRange::starting_at(lo, required),
        pos,
        lat: (lane_count - lo) as f64 * lane_width,
    })
}
