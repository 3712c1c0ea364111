//! Deciding when a vehicle moves into an adjacent lane.

use crate::lane::{Direction, LaneTable};
use crate::{RoadResult, VehicleId, VehicleSet};
use log::debug;

/// Moves the vehicle one lane to the left if there is room beside it there,
/// otherwise one lane to the right if there is room there.
/// Returns the direction it moved in, if any.
///
/// Only vehicles that were held back by a vehicle ahead during this tick look
/// for another lane; a stop line holds every lane alike.
pub(crate) fn change_lanes(
    lanes: &mut LaneTable,
    vehicles: &mut VehicleSet,
    id: VehicleId,
    lane_width: f64,
) -> RoadResult<Option<Direction>> {
    let vehicle = &vehicles[id];
    if !vehicle.is_on_road() || !vehicle.is_held_by_leader() {
        return Ok(None);
    }

    let Some(dir) = choose_direction(lanes, vehicles, id) else {
        return Ok(None);
    };
    lanes.migrate(vehicles, id, dir)?;

    let vehicle = &mut vehicles[id];
    match dir {
        Direction::Left => vehicle.shift_lat(lane_width),
        Direction::Right => vehicle.shift_lat(-lane_width),
    }
    debug!(
        "Vehicle {:?} moved {:?} into lanes {:?}",
        id,
        dir,
        vehicle.lanes()
    );
    Ok(Some(dir))
}

/// The direction the vehicle can move in, with left taking priority.
pub(crate) fn choose_direction(
    lanes: &LaneTable,
    vehicles: &VehicleSet,
    id: VehicleId,
) -> Option<Direction> {
    let vehicle = &vehicles[id];
    let range = vehicle.lanes();
    let front = vehicle.pos_front();
    let back = vehicle.pos_rear();

    [Direction::Left, Direction::Right]
        .into_iter()
        .find(|dir| match range.entering(*dir) {
            Some(lane) if lane < lanes.len() => lanes.has_space(vehicles, lane, front, back),
            _ => false,
        })
}
