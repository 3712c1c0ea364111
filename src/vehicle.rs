use self::acceleration::{AccelerationModel, Motion};
use crate::lane::LaneRange;
use crate::math::{Point2d, EPSILON};
use crate::util::Interval;
use crate::VehicleId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod acceleration;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// The kind of vehicle, e.g. "Car" or "Truck".
    kind: String,
    /// The colour the vehicle is drawn in.
    color: String,
    /// The vehicle's width in m.
    width: f64,
    /// The vehicle's length in m.
    length: f64,
    /// The skill of the driver.
    skill: u32,
    /// The gap to keep behind the obstacle ahead in m.
    safety_distance: f64,
    /// The acceleration model
    acc: AccelerationModel,
    /// The longitudinal position of the front of the vehicle, in m.
    pos: f64,
    /// The lateral position of the vehicle from the bottom edge of the road, in m.
    lat: f64,
    /// The velocity in m/s.
    vel: f64,
    /// Where the vehicle would be at the end of this tick if nothing were ahead of it.
    unrestricted_pos: f64,
    /// The lanes the vehicle occupies.
    lanes: LaneRange,
    /// Whether the vehicle is on the road.
    on_road: bool,
    /// How far through the current tick the vehicle is.
    progress: TickProgress,
    /// Whether a stop line, rather than another vehicle, bounded the vehicle this tick.
    held_at_line: bool,
}

/// The attributes of a simulated vehicle.
/// A road clones these into a fresh [Vehicle] whenever one is added.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleAttributes {
    /// The kind of vehicle, e.g. "Car" or "Truck".
    pub kind: String,
    /// The vehicle length in m.
    pub length: f64,
    /// The vehicle width in m.
    pub width: f64,
    /// The top speed of the vehicle, in m/s.
    pub max_speed: f64,
    /// The maximum acceleration of the vehicle, in m/s^2.
    pub acceleration: f64,
    /// The skill of the driver.
    pub skill: u32,
    /// The gap to keep behind the obstacle ahead in m.
    pub safety_distance: f64,
}

/// Where a vehicle is in the current simulation tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub(crate) enum TickProgress {
    /// Not yet advanced.
    #[default]
    Pending,
    /// Waiting on the vehicles ahead of it to advance.
    Resolving,
    /// Advanced.
    Processed,
}

impl Default for VehicleAttributes {
    fn default() -> Self {
        Self {
            kind: "Car".into(),
            length: 2.0,
            width: 2.0,
            max_speed: 1.0,
            acceleration: 1.0,
            skill: 1,
            safety_distance: 1.0,
        }
    }
}

impl Vehicle {
    /// Creates a new vehicle.
    pub(crate) fn new(id: VehicleId, attributes: &VehicleAttributes, color: &str) -> Self {
        Self {
            id,
            kind: attributes.kind.clone(),
            color: color.to_string(),
            width: attributes.width,
            length: attributes.length,
            skill: attributes.skill,
            safety_distance: f64::max(attributes.safety_distance, 0.0),
            acc: AccelerationModel::new(&acceleration::ModelParams {
                max_acceleration: attributes.acceleration,
                max_speed: attributes.max_speed,
            }),
            pos: 0.0,
            lat: 0.0,
            vel: 0.0,
            unrestricted_pos: 0.0,
            lanes: LaneRange::new(0, 0),
            on_road: false,
            progress: TickProgress::Pending,
            held_at_line: false,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The kind of vehicle.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The colour the vehicle is drawn in.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// The vehicle's width in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The skill of the driver.
    pub fn skill(&self) -> u32 {
        self.skill
    }

    /// The gap the vehicle keeps behind the obstacle ahead, in m.
    pub fn safety_distance(&self) -> f64 {
        self.safety_distance
    }

    /// The vehicle's top speed in m/s.
    pub fn max_speed(&self) -> f64 {
        self.acc.max_vel()
    }

    /// The longitudinal position of the front of the vehicle in m.
    pub fn pos_front(&self) -> f64 {
        self.pos
    }

    /// The longitudinal position of the rear of the vehicle in m.
    pub fn pos_rear(&self) -> f64 {
        self.pos - self.length
    }

    /// The lateral position of the vehicle, measured from the bottom edge of the road, in m.
    pub fn pos_lat(&self) -> f64 {
        self.lat
    }

    /// The position of the front of the vehicle as (longitudinal, lateral) coordinates.
    pub fn coords(&self) -> Point2d {
        Point2d::new(self.pos, self.lat)
    }

    /// The longitudinal extent of the vehicle.
    pub fn footprint(&self) -> Interval<f64> {
        Interval::new(self.pos_rear(), self.pos_front())
    }

    /// The vehicle's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The lanes the vehicle occupies.
    pub fn lanes(&self) -> LaneRange {
        self.lanes
    }

    /// Whether the vehicle is on the road.
    pub fn is_on_road(&self) -> bool {
        self.on_road
    }

    /// Whether the vehicle has been advanced during the current tick.
    pub fn is_processed(&self) -> bool {
        self.progress == TickProgress::Processed
    }

    /// Where the vehicle would be at the end of the current tick if nothing were ahead of it.
    pub fn unrestricted_pos(&self) -> f64 {
        self.unrestricted_pos
    }

    /// Whether something ahead of the vehicle held it back during the current tick.
    pub fn is_impeded(&self) -> bool {
        self.is_processed() && self.pos + EPSILON < self.unrestricted_pos
    }

    /// Whether a vehicle ahead, rather than a stop line, held the vehicle back during the current tick.
    pub fn is_held_by_leader(&self) -> bool {
        self.is_impeded() && !self.held_at_line
    }

    pub(crate) fn progress(&self) -> TickProgress {
        self.progress
    }

    pub(crate) fn set_progress(&mut self, progress: TickProgress) {
        self.progress = progress;
    }

    pub(crate) fn set_lanes(&mut self, lanes: LaneRange) {
        self.lanes = lanes;
    }

    pub(crate) fn set_velocity_adjust(&mut self, factor: f64) {
        self.acc.set_velocity_adjust(factor);
    }

    /// Places the vehicle on the road.
    pub(crate) fn place(&mut self, pos: f64, lat: f64) {
        self.pos = pos;
        self.lat = lat;
        self.unrestricted_pos = pos;
        self.vel = 0.0;
        self.on_road = true;
        self.progress = TickProgress::Pending;
    }

    /// Takes the vehicle off the road.
    pub(crate) fn leave_road(&mut self) {
        self.on_road = false;
    }

    /// Shifts the vehicle's lateral position by `offset` m.
    pub(crate) fn shift_lat(&mut self, offset: f64) {
        self.lat += offset;
    }

    /// Resets the vehicle in preparation for a new tick.
    pub(crate) fn reset(&mut self) {
        self.progress = TickProgress::Pending;
        self.unrestricted_pos = self.pos;
        self.held_at_line = false;
    }

    /// Computes where the vehicle would be after `dt` s if nothing were ahead of it.
    /// Does not move the vehicle.
    pub(crate) fn unrestricted(&self, dt: f64) -> f64 {
        self.acc.free_motion(self.pos, self.vel, dt).pos
    }

    /// Records the vehicle's unrestricted position for the current tick.
    pub(crate) fn update_unrestricted(&mut self, dt: f64) {
        self.unrestricted_pos = self.unrestricted(dt);
    }

    /// Advances the vehicle by `dt` s, keeping at least the safety distance
    /// behind an obstacle at `obstacle`, and marks it as processed.
    pub(crate) fn advance(&mut self, dt: f64, obstacle: f64) {
        let limit = obstacle - self.safety_distance;
        let Motion { pos, vel } = self.acc.bounded_motion(self.pos, self.vel, dt, limit);
        self.pos = pos;
        self.vel = vel;
        self.progress = TickProgress::Processed;
        self.held_at_line = false;
    }

    /// Advances the vehicle by `dt` s behind a leader whose rear is at `leader`,
    /// also stopping short of `stop_line` if there is one.
    pub(crate) fn advance_behind(&mut self, dt: f64, leader: f64, stop_line: Option<f64>) {
        match stop_line {
            Some(line) if line <= leader => {
                self.advance(dt, line);
                self.held_at_line = true;
            }
            _ => self.advance(dt, leader),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn vehicle() -> Vehicle {
        let attributes = VehicleAttributes {
            kind: "Car".into(),
            length: 4.0,
            width: 2.0,
            max_speed: 10.0,
            acceleration: 2.0,
            skill: 3,
            safety_distance: 1.0,
        };
        let mut vehicle = Vehicle::new(VehicleId::default(), &attributes, "red");
        vehicle.place(0.0, 2.0);
        vehicle
    }

    #[test]
    fn advance_stops_short_of_obstacle() {
        let mut v = vehicle();
        v.advance(2.0, 3.0);
        assert_approx_eq!(v.pos_front(), 2.0);
        assert!(v.is_processed());
    }

    #[test]
    fn advance_with_open_road_is_unrestricted() {
        let mut v = vehicle();
        let expected = v.unrestricted(1.0);
        v.advance(1.0, f64::INFINITY);
        assert_approx_eq!(v.pos_front(), expected);
        assert_approx_eq!(v.vel(), 2.0);
    }

    #[test]
    fn unrestricted_does_not_process() {
        let mut v = vehicle();
        v.update_unrestricted(1.0);
        assert_approx_eq!(v.unrestricted_pos(), 1.0);
        assert_approx_eq!(v.pos_front(), 0.0);
        assert!(!v.is_processed());
    }

    #[test]
    fn impeded_when_held_back() {
        let mut v = vehicle();
        v.update_unrestricted(1.0);
        v.advance(1.0, 1.5);
        assert!(v.is_impeded());

        v.reset();
        v.update_unrestricted(1.0);
        v.advance(1.0, f64::INFINITY);
        assert!(!v.is_impeded());
    }

    #[test]
    fn stop_line_hold_is_not_a_leader_hold() {
        let mut v = vehicle();
        v.update_unrestricted(2.0);
        v.advance_behind(2.0, 10.0, Some(3.0));
        assert_approx_eq!(v.pos_front(), 2.0);
        assert!(v.is_impeded());
        assert!(!v.is_held_by_leader());

        v.reset();
        v.update_unrestricted(2.0);
        v.advance_behind(2.0, 3.5, Some(30.0));
        assert_approx_eq!(v.pos_front(), 2.5);
        assert!(v.is_held_by_leader());
    }

    #[test]
    fn advance_is_monotonic_in_dt() {
        let mut last = f64::NEG_INFINITY;
        for i in 0..40 {
            let mut v = vehicle();
            v.advance(0.1 * i as f64, 6.0);
            assert!(v.pos_front() >= last);
            assert!(v.pos_front() <= 5.0);
            assert!(v.vel() >= 0.0 && v.vel() <= v.max_speed());
            last = v.pos_front();
        }
    }

    #[test]
    fn footprint_spans_length() {
        let v = vehicle();
        assert_eq!(v.footprint(), Interval::new(-4.0, 0.0));
        assert_eq!(v.coords(), Point2d::new(0.0, 2.0));
    }
}
