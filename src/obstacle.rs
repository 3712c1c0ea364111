//! Finding what lies ahead of a vehicle, advancing the vehicles ahead first.

use crate::lane::LaneTable;
use crate::signal::Signal;
use crate::vehicle::TickProgress;
use crate::{RoadError, RoadResult, VehicleId, VehicleSet};
use smallvec::SmallVec;

/// The obstacle distance reported when nothing is ahead of a vehicle.
pub const OPEN_ROAD: f64 = f64::INFINITY;

/// Advances vehicles for one tick, making sure that every vehicle's leaders
/// have been advanced before it looks at where they are.
pub(crate) struct ObstacleResolver<'a> {
    vehicles: &'a mut VehicleSet,
    lanes: &'a LaneTable,
    signal: &'a Signal,
    /// The time step in s.
    dt: f64,
    /// The deepest chain of leaders that can exist.
    max_depth: usize,
}

impl<'a> ObstacleResolver<'a> {
    pub fn new(
        vehicles: &'a mut VehicleSet,
        lanes: &'a LaneTable,
        signal: &'a Signal,
        dt: f64,
    ) -> Self {
        let max_depth = vehicles.len();
        Self {
            vehicles,
            lanes,
            signal,
            dt,
            max_depth,
        }
    }

    /// Advances the vehicle unless it has already been advanced this tick.
    pub fn process(&mut self, id: VehicleId) -> RoadResult<()> {
        self.process_at(id, 0)
    }

    /// Finds the rear of the nearest vehicle ahead of this one in any of its lanes,
    /// or [OPEN_ROAD] if there is none. Leaders are advanced first if need be.
    pub fn resolve(&mut self, id: VehicleId) -> RoadResult<f64> {
        self.resolve_at(id, 0)
    }

    fn process_at(&mut self, id: VehicleId, depth: usize) -> RoadResult<()> {
        let vehicle = &mut self.vehicles[id];
        if !vehicle.is_on_road() {
            return Ok(());
        }
        match vehicle.progress() {
            TickProgress::Processed => return Ok(()),
            TickProgress::Resolving => {
                return Err(RoadError::InvariantViolation(format!(
                    "vehicle {:?} is its own leader",
                    id
                )))
            }
            TickProgress::Pending => vehicle.set_progress(TickProgress::Resolving),
        }

        let obstacle = self.resolve_at(id, depth)?;
        let vehicle = &mut self.vehicles[id];
        let stop_line = self.signal.stop_line_for(vehicle.pos_front());
        vehicle.advance_behind(self.dt, obstacle, stop_line);
        Ok(())
    }

    fn resolve_at(&mut self, id: VehicleId, depth: usize) -> RoadResult<f64> {
        if depth > self.max_depth {
            return Err(RoadError::InvariantViolation(format!(
                "leader chain of vehicle {:?} is longer than the number of vehicles",
                id
            )));
        }

        let leaders = self.leaders(id);
        let mut obstacle = OPEN_ROAD;
        for leader in leaders {
            if self.vehicles[leader].progress() != TickProgress::Processed {
                self.process_at(leader, depth + 1)?;
            }
            obstacle = f64::min(obstacle, self.vehicles[leader].pos_rear());
        }
        Ok(obstacle)
    }

    /// The nearest on-road vehicle ahead of this one in each of its lanes.
    fn leaders(&self, id: VehicleId) -> SmallVec<[VehicleId; 4]> {
        let mut leaders = SmallVec::new();
        for lane in self.vehicles[id].lanes().iter() {
            let mut last = None;
            for other in self.lanes.lane(lane) {
                if *other == id {
                    break;
                }
                if self.vehicles[*other].is_on_road() {
                    last = Some(*other);
                }
            }
            if let Some(leader) = last {
                if !leaders.contains(&leader) {
                    leaders.push(leader);
                }
            }
        }
        leaders
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{SignalState, Vehicle, VehicleAttributes};
    use assert_approx_eq::assert_approx_eq;

    struct Fixture {
        vehicles: VehicleSet,
        lanes: LaneTable,
        signal: Signal,
    }

    impl Fixture {
        fn new(lanes: usize) -> Self {
            let mut signal = Signal::default();
            signal.set_state(SignalState::Green);
            Self {
                vehicles: VehicleSet::with_key(),
                lanes: LaneTable::new(lanes),
                signal,
            }
        }

        fn add(&mut self, pos: f64, lo: usize, count: usize) -> VehicleId {
            let attributes = VehicleAttributes {
                length: 4.0,
                max_speed: 10.0,
                acceleration: 2.0,
                safety_distance: 1.0,
                ..Default::default()
            };
            let id = self.vehicles.insert_with_key(|id| {
                let mut vehicle = Vehicle::new(id, &attributes, "white");
                vehicle.place(pos, 0.0);
                vehicle
            });
            self.lanes.assign(&mut self.vehicles, id, lo, count);
            id
        }

        fn resolver(&mut self, dt: f64) -> ObstacleResolver<'_> {
            ObstacleResolver::new(&mut self.vehicles, &self.lanes, &self.signal, dt)
        }
    }

    #[test]
    fn open_road_without_leader() {
        let mut f = Fixture::new(2);
        let a = f.add(0.0, 0, 1);
        f.add(20.0, 1, 1);
        assert_eq!(f.resolver(1.0).resolve(a).unwrap(), OPEN_ROAD);
    }

    #[test]
    fn leader_is_advanced_first() {
        let mut f = Fixture::new(1);
        let leader = f.add(10.0, 0, 1);
        let follower = f.add(0.0, 0, 1);

        let obstacle = f.resolver(1.0).resolve(follower).unwrap();
        assert!(f.vehicles[leader].is_processed());
        assert!(!f.vehicles[follower].is_processed());
        assert_approx_eq!(f.vehicles[leader].pos_front(), 11.0);
        assert_approx_eq!(obstacle, 7.0);
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut f = Fixture::new(1);
        f.add(10.0, 0, 1);
        let follower = f.add(0.0, 0, 1);
        let mut resolver = f.resolver(1.0);
        let first = resolver.resolve(follower).unwrap();
        let second = resolver.resolve(follower).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn nearest_leader_across_all_lanes() {
        let mut f = Fixture::new(3);
        f.add(30.0, 0, 1);
        let near = f.add(12.0, 2, 1);
        let wide = f.add(0.0, 0, 3);

        let obstacle = f.resolver(0.0).resolve(wide).unwrap();
        assert_approx_eq!(obstacle, f.vehicles[near].pos_rear());
        assert_approx_eq!(obstacle, 8.0);
    }

    #[test]
    fn chain_of_leaders_is_processed_in_order() {
        let mut f = Fixture::new(1);
        let ids: Vec<_> = (0..5).map(|i| f.add(40.0 - 5.0 * i as f64, 0, 1)).collect();

        f.resolver(1.0).process(ids[4]).unwrap();
        assert!(ids.iter().all(|id| f.vehicles[*id].is_processed()));
        for pair in ids.windows(2) {
            let leader = &f.vehicles[pair[0]];
            let follower = &f.vehicles[pair[1]];
            assert!(follower.pos_front() <= leader.pos_rear() - follower.safety_distance() + 1e-9);
        }
    }

    #[test]
    fn follower_is_clamped_behind_leader() {
        let mut f = Fixture::new(1);
        let leader = f.add(6.0, 0, 1);
        let follower = f.add(0.0, 0, 1);
        // The leader has already stood still for this tick
        f.vehicles[leader].advance(0.0, OPEN_ROAD);

        f.resolver(2.0).process(follower).unwrap();
        // Unrestricted motion would reach 4 m, but the leader's rear is at 2 m
        assert_approx_eq!(f.vehicles[leader].pos_front(), 6.0);
        assert_approx_eq!(f.vehicles[follower].pos_front(), 1.0);
    }

    #[test]
    fn vehicles_off_the_road_are_ignored() {
        let mut f = Fixture::new(1);
        let gone = f.add(6.0, 0, 1);
        let follower = f.add(0.0, 0, 1);
        f.vehicles[gone].leave_road();
        assert_eq!(f.resolver(1.0).resolve(follower).unwrap(), OPEN_ROAD);
        assert!(!f.vehicles[gone].is_processed());
    }

    #[test]
    fn red_signal_holds_vehicles_behind_line() {
        let mut f = Fixture::new(1);
        f.signal.set_state(SignalState::Red);
        f.signal.set_pos(3.0);
        let held = f.add(0.0, 0, 1);
        let past = f.add(8.0, 0, 1);

        let mut resolver = f.resolver(2.0);
        resolver.process(held).unwrap();
        assert_approx_eq!(f.vehicles[held].pos_front(), 2.0);
        assert!(!f.vehicles[held].is_held_by_leader());
        assert_approx_eq!(f.vehicles[past].pos_front(), 12.0);
    }

    #[test]
    fn reentrant_resolution_is_an_invariant_violation() {
        let mut f = Fixture::new(1);
        let leader = f.add(10.0, 0, 1);
        let follower = f.add(0.0, 0, 1);
        f.vehicles[leader].set_progress(TickProgress::Resolving);
        assert!(matches!(
            f.resolver(1.0).process(follower),
            Err(RoadError::InvariantViolation(_))
        ));
    }
}
