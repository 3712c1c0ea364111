use crate::entry::plan_entry;
use crate::lane::LaneTable;
use crate::lane_change::change_lanes;
use crate::obstacle::ObstacleResolver;
use crate::signal::{Signal, SignalState};
use crate::vehicle::{Vehicle, VehicleAttributes};
use crate::{RoadError, RoadResult, VehicleId, VehicleSet};
use log::{debug, trace, warn};
use rand_distr::Distribution;

/// A simulated road segment with one or more lanes.
#[derive(Clone, Debug, Default)]
pub struct Road {
    /// The road ID.
    id: u32,
    /// The length of the road in m.
    length: f64,
    /// The width of the road in m.
    width: f64,
    /// The vehicles in each lane, if the lanes have been set up.
    lanes: Option<LaneTable>,
    /// The traffic signal.
    signal: Signal,
    /// The attributes of vehicles added without a template of their own.
    defaults: VehicleAttributes,
    /// The vehicles on the road.
    vehicles: VehicleSet,
    /// The vehicles in order of decreasing lateral position.
    order: Vec<VehicleId>,
    /// The current frame of simulation.
    frame: usize,
}

impl Road {
    /// Creates a new road.
    pub fn new(id: u32, length: f64, width: f64) -> Self {
        Self {
            id,
            length,
            width,
            ..Default::default()
        }
    }

    /// The road ID.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The length of the road in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The width of the road in m.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The number of lanes, or zero if they haven't been set up.
    pub fn lane_count(&self) -> usize {
        self.lanes.as_ref().map_or(0, LaneTable::len)
    }

    /// The width of a single lane in m, if the lanes have been set up.
    pub fn lane_width(&self) -> Option<f64> {
        let count = self.lane_count();
        (count > 0).then(|| self.width / count as f64)
    }

    /// Splits the road into `count` lanes of equal width.
    ///
    /// Any vehicles already on the road are removed.
    pub fn init_lanes(&mut self, count: usize) -> RoadResult<()> {
        if count == 0 {
            return Err(RoadError::InvalidLaneCount(count));
        }
        if !self.vehicles.is_empty() {
            warn!(
                "Re-initialising the lanes of road {} removes its {} vehicles",
                self.id,
                self.vehicles.len()
            );
            self.vehicles.clear();
            self.order.clear();
        }
        self.lanes = Some(LaneTable::new(count));
        debug!("Road {} split into {} lanes", self.id, count);
        Ok(())
    }

    /// Sets the attributes of vehicles added with [Road::add_default_vehicle].
    pub fn set_defaults(&mut self, attributes: &VehicleAttributes) {
        self.defaults = attributes.clone();
    }

    /// The attributes of vehicles added with [Road::add_default_vehicle].
    pub fn defaults(&self) -> &VehicleAttributes {
        &self.defaults
    }

    /// Sets the traffic signal from its name, either `"RED"` or `"GREEN"`.
    pub fn set_signal(&mut self, signal: &str) -> RoadResult<()> {
        self.set_signal_state(signal.parse()?);
        Ok(())
    }

    /// Sets the state of the traffic signal.
    pub fn set_signal_state(&mut self, state: SignalState) {
        self.signal.set_state(state);
    }

    /// Moves the traffic signal's stop line to `pos` m along the road.
    pub fn set_signal_position(&mut self, pos: f64) {
        self.signal.set_pos(pos);
    }

    /// The traffic signal.
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Whether the traffic signal is red.
    pub fn is_red(&self) -> bool {
        self.signal.state() == SignalState::Red
    }

    /// Adds a copy of the `template` vehicle to the start of the road.
    ///
    /// The vehicle enters in the group of lanes with the most room behind the start of the road.
    pub fn add_vehicle(&mut self, template: &VehicleAttributes, color: &str) -> RoadResult<VehicleId> {
        let plan = plan_entry(self.lanes.as_ref(), &self.vehicles, self.width, template.width)?;
        let lanes = self.lanes.as_mut().ok_or(RoadError::LanesUninitialized)?;

        let vehicle_id = self.vehicles.insert_with_key(|id| {
            let mut vehicle = Vehicle::new(id, template, color);
            vehicle.place(plan.pos, plan.lat);
            vehicle
        });
        lanes.assign(&mut self.vehicles, vehicle_id, plan.lanes.lo, plan.lanes.count());

        let idx = self
            .order
            .iter()
            .position(|id| plan.lat > self.vehicles[*id].pos_lat())
            .unwrap_or(self.order.len());
        self.order.insert(idx, vehicle_id);

        debug!(
            "{} of {} added to lanes {:?} at ({}, {})",
            template.kind, color, plan.lanes, plan.pos, plan.lat
        );
        Ok(vehicle_id)
    }

    /// Adds a vehicle with the road's default attributes. [Read more](Self::add_vehicle).
    pub fn add_default_vehicle(&mut self, color: &str) -> RoadResult<VehicleId> {
        let template = self.defaults.clone();
        self.add_vehicle(&template, color)
    }

    /// Removes a vehicle from the road.
    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Vehicle> {
        let mut vehicle = self.vehicles.remove(id)?;
        if let Some(lanes) = self.lanes.as_mut() {
            if let Err(err) = lanes.remove(id, vehicle.lanes()) {
                panic!("{}", err);
            }
        }
        self.order.retain(|other| *other != id);
        vehicle.leave_road();
        Some(vehicle)
    }

    /// Randomly assigns a desired speed adjustment factor to each vehicle,
    /// which is sampled from a normal distribution with a mean of 1 (no adjustment)
    /// and standard deviation of `stddev`.
    pub fn randomise_speed_adjusts(&mut self, stddev: f64) -> RoadResult<()> {
        let mut rand = rand::thread_rng();
        let distr = rand_distr::Normal::new(1.0, stddev)
            .map_err(|_| RoadError::InvalidSpeedSpread(stddev))?;
        for (_, vehicle) in &mut self.vehicles {
            let factor = distr.sample(&mut rand).clamp(0.75, 1.25);
            vehicle.set_velocity_adjust(factor);
        }
        Ok(())
    }

    /// Advances the simulation by `dt` seconds and counts the frame.
    pub fn run_sim_tick(&mut self, dt: f64) {
        self.update_sim(dt);
        self.frame += 1;
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Panics
    /// If the lane bookkeeping has become inconsistent, which would
    /// silently corrupt the simulation if it were allowed to continue.
    pub fn update_sim(&mut self, dt: f64) {
        if let Err(err) = self.try_update(dt) {
            panic!("{}", err);
        }
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Returns an iterator over all the vehicles on the road, in order of decreasing lateral position.
    pub fn iter_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.order.iter().map(|id| &self.vehicles[*id])
    }

    /// The number of vehicles on the road.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Gets a reference to the vehicle with the given ID, if it's still on the road.
    pub fn get_vehicle(&self, vehicle_id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(vehicle_id)
    }

    /// The vehicles in the given lane, front-most first.
    pub fn lane(&self, lane: usize) -> &[VehicleId] {
        self.lanes
            .as_ref()
            .filter(|lanes| lane < lanes.len())
            .map(|lanes| lanes.lane(lane))
            .unwrap_or(&[])
    }

    /// Finds where the nearest vehicle ahead of the given one ends, advancing
    /// any vehicles ahead of it that haven't yet moved this tick.
    /// Returns `f64::INFINITY` if nothing is ahead.
    pub fn resolve_obstacle(&mut self, vehicle_id: VehicleId, dt: f64) -> RoadResult<f64> {
        let lanes = self.lanes.as_ref().ok_or(RoadError::LanesUninitialized)?;
        ObstacleResolver::new(&mut self.vehicles, lanes, &self.signal, dt).resolve(vehicle_id)
    }

    fn try_update(&mut self, dt: f64) -> RoadResult<()> {
        let Some(lanes) = self.lanes.as_mut() else {
            return Ok(());
        };

        // Start the tick afresh
        for (_, vehicle) in &mut self.vehicles {
            vehicle.reset();
        }

        // Record where each vehicle would get to with nothing in its way
        for (_, vehicle) in &mut self.vehicles {
            if vehicle.is_on_road() {
                vehicle.update_unrestricted(dt);
            }
        }

        // Advance every vehicle, leaders before followers
        let mut resolver = ObstacleResolver::new(&mut self.vehicles, lanes, &self.signal, dt);
        for id in &self.order {
            resolver.process(*id)?;
        }

        // Let vehicles that were held up look for a clearer lane
        let lane_width = self.width / lanes.len() as f64;
        let mut changes = 0;
        for id in &self.order {
            if change_lanes(lanes, &mut self.vehicles, *id, lane_width)?.is_some() {
                changes += 1;
            }
        }
        debug_assert!(lanes.is_ordered(&self.vehicles));

        // Remove vehicles that have driven off the end of the road
        let exited = self
            .vehicles
            .iter()
            .filter(|(_, v)| self.length > 0.0 && v.pos_rear() >= self.length)
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        for id in &exited {
            let vehicle = self.vehicles.remove(*id).ok_or_else(|| {
                RoadError::InvariantViolation(format!("vehicle {:?} vanished", id))
            })?;
            lanes.remove(*id, vehicle.lanes())?;
            debug!("Vehicle {:?} left road {}", id, self.id);
        }
        if !exited.is_empty() {
            self.order.retain(|id| !exited.contains(id));
        }

        trace!(
            "Road {} frame {}: {} vehicles, {} lane changes, {} exits",
            self.id,
            self.frame,
            self.vehicles.len(),
            changes,
            exited.len()
        );
        Ok(())
    }
}
