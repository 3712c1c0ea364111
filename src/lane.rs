//! Per-lane occupancy bookkeeping.

use crate::util::Interval;
use crate::{RoadError, RoadResult, VehicleId, VehicleSet};
use itertools::Itertools;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// A contiguous, inclusive range of lanes. Lane 0 is the leftmost (top) lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneRange {
    /// The leftmost lane in the range.
    pub lo: usize,
    /// The rightmost lane in the range.
    pub hi: usize,
}

/// A sideways direction across the road.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Towards lane 0.
    Left,
    /// Away from lane 0.
    Right,
}

/// The vehicles occupying each lane of a road.
///
/// Each lane lists its vehicles front-most first, in non-increasing order of
/// longitudinal position. Vehicles at the same position keep the order in
/// which they were inserted.
#[derive(Clone, Debug)]
pub(crate) struct LaneTable {
    lanes: Vec<Vec<VehicleId>>,
}

impl LaneRange {
    /// Creates a new lane range.
    pub const fn new(lo: usize, hi: usize) -> Self {
        Self { lo, hi }
    }

    /// Creates the range of `count` lanes starting at `lo`.
    pub fn starting_at(lo: usize, count: usize) -> Self {
        Self::new(lo, lo + count.saturating_sub(1))
    }

    /// The number of lanes in the range.
    pub fn count(&self) -> usize {
        self.hi - self.lo + 1
    }

    /// Whether the range includes the given lane.
    pub fn contains(&self, lane: usize) -> bool {
        self.lo <= lane && lane <= self.hi
    }

    /// Iterates over the lanes in the range, left to right.
    pub fn iter(&self) -> RangeInclusive<usize> {
        self.lo..=self.hi
    }

    /// The lane that would be entered by shifting one lane in the given direction.
    pub fn entering(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Left => self.lo.checked_sub(1),
            Direction::Right => Some(self.hi + 1),
        }
    }

    /// The lane that would be vacated by shifting one lane in the given direction.
    pub fn vacating(&self, dir: Direction) -> usize {
        match dir {
            Direction::Left => self.hi,
            Direction::Right => self.lo,
        }
    }

    /// The range shifted by one lane in the given direction.
    pub fn shifted(&self, dir: Direction) -> Option<Self> {
        self.entering(dir).map(|lane| match dir {
            Direction::Left => Self::new(lane, self.hi - 1),
            Direction::Right => Self::new(self.lo + 1, lane),
        })
    }
}

impl LaneTable {
    /// Creates a table of `count` empty lanes.
    pub fn new(count: usize) -> Self {
        Self {
            lanes: vec![vec![]; count],
        }
    }

    /// The number of lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// The vehicles in the given lane, front-most first.
    pub fn lane(&self, lane: usize) -> &[VehicleId] {
        &self.lanes[lane]
    }

    /// For each lane, the rearmost point occupied by any vehicle,
    /// or `f64::INFINITY` if the lane is empty.
    pub fn back_ends(&self, vehicles: &VehicleSet) -> Vec<f64> {
        self.lanes
            .iter()
            .map(|lane| {
                lane.iter()
                    .map(|id| vehicles[*id].pos_rear())
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }

    /// Inserts the vehicle into `count` lanes starting at `lo`,
    /// and sets the vehicle's occupied lanes accordingly.
    pub fn assign(&mut self, vehicles: &mut VehicleSet, id: VehicleId, lo: usize, count: usize) {
        let range = LaneRange::starting_at(lo, count);
        for lane in range.iter() {
            self.insert(vehicles, lane, id);
        }
        vehicles[id].set_lanes(range);
    }

    /// Moves the vehicle one lane over in the given direction: it is inserted
    /// into the lane it enters and removed from the lane it vacates.
    pub fn migrate(
        &mut self,
        vehicles: &mut VehicleSet,
        id: VehicleId,
        dir: Direction,
    ) -> RoadResult<()> {
        let range = vehicles[id].lanes();
        let target = range
            .shifted(dir)
            .filter(|shifted| shifted.hi < self.len())
            .ok_or_else(|| {
                RoadError::InvariantViolation(format!(
                    "vehicle {:?} in lanes {:?} can't move {:?}",
                    id, range, dir
                ))
            })?;
        let vacated = range.vacating(dir);
        self.remove_from(vacated, id)?;
        if let Some(entered) = range.entering(dir) {
            self.insert(vehicles, entered, id);
        }
        vehicles[id].set_lanes(target);
        Ok(())
    }

    /// Removes the vehicle from every lane in `range`.
    pub fn remove(&mut self, id: VehicleId, range: LaneRange) -> RoadResult<()> {
        for lane in range.iter() {
            self.remove_from(lane, id)?;
        }
        Ok(())
    }

    /// Whether the lane has room for something spanning `back` to `front`.
    pub fn has_space(&self, vehicles: &VehicleSet, lane: usize, front: f64, back: f64) -> bool {
        let extent = Interval::new(back, front);
        self.lanes[lane]
            .iter()
            .all(|id| !vehicles[*id].footprint().overlaps(&extent))
    }

    /// Whether every lane is ordered front-most first.
    pub fn is_ordered(&self, vehicles: &VehicleSet) -> bool {
        self.lanes.iter().all(|lane| {
            lane.iter()
                .map(|id| vehicles[*id].pos_front())
                .tuple_windows()
                .all(|(a, b)| a >= b)
        })
    }

    /// Inserts the vehicle after every vehicle at or ahead of its position.
    fn insert(&mut self, vehicles: &VehicleSet, lane: usize, id: VehicleId) {
        let pos = vehicles[id].pos_front();
        let lane = &mut self.lanes[lane];
        let idx = lane
            .iter()
            .position(|other| vehicles[*other].pos_front() < pos)
            .unwrap_or(lane.len());
        lane.insert(idx, id);
    }

    fn remove_from(&mut self, lane: usize, id: VehicleId) -> RoadResult<()> {
        let ids = self.lanes.get_mut(lane).ok_or_else(|| {
            RoadError::InvariantViolation(format!("lane {} does not exist", lane))
        })?;
        let idx = ids.iter().position(|v| *v == id).ok_or_else(|| {
            RoadError::InvariantViolation(format!("vehicle {:?} is not in lane {}", id, lane))
        })?;
        ids.remove(idx);
        Ok(())
    }
}
