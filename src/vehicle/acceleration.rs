/// The acceleration model of a vehicle.
///
/// Vehicles accelerate at a constant rate up to their (adjusted) top speed,
/// and are clamped short of whatever is ahead of them.
#[derive(Clone, Debug)]
pub struct AccelerationModel {
    max_acc: f64,
    max_vel: f64,
    vel_adj: f64,
}

/// The parameters of the acceleration model.
pub struct ModelParams {
    /// The vehicle's maximum acceleration in m/s<sup>2</sup>.
    pub max_acceleration: f64,
    /// The vehicle's top speed in m/s.
    pub max_speed: f64,
}

/// The state of a vehicle after one step of motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// The longitudinal position in m.
    pub pos: f64,
    /// The velocity in m/s.
    pub vel: f64,
}

impl AccelerationModel {
    /// Creates a new acceleration model.
    pub fn new(params: &ModelParams) -> Self {
        AccelerationModel {
            max_acc: f64::max(params.max_acceleration, 0.0),
            max_vel: f64::max(params.max_speed, 0.0),
            vel_adj: 1.0,
        }
    }

    /// Set the desired velocity adjustment factor.
    pub fn set_velocity_adjust(&mut self, factor: f64) {
        self.vel_adj = factor;
    }

    /// The top speed of the vehicle after adjustment, in m/s.
    pub fn max_vel(&self) -> f64 {
        self.vel_adj * self.max_vel
    }

    /// Integrates the motion of the vehicle over `dt` seconds with nothing ahead of it.
    pub fn free_motion(&self, pos: f64, vel: f64, dt: f64) -> Motion {
        let dt = f64::max(dt, 0.0);
        let max_vel = self.max_vel();
        let vel = vel.clamp(0.0, max_vel);
        let new_vel = f64::min(vel + self.max_acc * dt, max_vel);
        Motion {
            pos: pos + 0.5 * (vel + new_vel) * dt,
            vel: new_vel,
        }
    }

    /// Integrates the motion of the vehicle over `dt` seconds without passing `limit`.
    ///
    /// The vehicle never moves backwards, even if it already stands beyond `limit`.
    /// Its resulting velocity is the average velocity over the step.
    pub fn bounded_motion(&self, pos: f64, vel: f64, dt: f64, limit: f64) -> Motion {
        let free = self.free_motion(pos, vel, dt);
        if free.pos <= limit {
            return free;
        }
        let new_pos = f64::max(pos, limit);
        let new_vel = if dt > 0.0 {
            ((new_pos - pos) / dt).clamp(0.0, self.max_vel())
        } else {
            0.0
        };
        Motion {
            pos: new_pos,
            vel: new_vel,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn model() -> AccelerationModel {
        AccelerationModel::new(&ModelParams {
            max_acceleration: 2.0,
            max_speed: 10.0,
        })
    }

    #[test]
    fn free_motion_accelerates_to_top_speed() {
        let acc = model();
        let m = acc.free_motion(0.0, 0.0, 1.0);
        assert_approx_eq!(m.pos, 1.0);
        assert_approx_eq!(m.vel, 2.0);

        let m = acc.free_motion(0.0, 9.0, 1.0);
        assert_approx_eq!(m.vel, 10.0);
        assert_approx_eq!(m.pos, 9.5);

        let m = acc.free_motion(0.0, 10.0, 2.0);
        assert_approx_eq!(m.pos, 20.0);
        assert_approx_eq!(m.vel, 10.0);
    }

    #[test]
    fn free_motion_is_monotonic_in_dt() {
        let acc = model();
        let mut last = 0.0;
        for i in 0..100 {
            let m = acc.free_motion(3.0, 4.0, 0.05 * i as f64);
            assert!(m.pos >= last);
            last = m.pos;
        }
    }

    #[test]
    fn bounded_motion_clamps_to_limit() {
        let acc = model();
        let m = acc.bounded_motion(0.0, 10.0, 1.0, 4.0);
        assert_approx_eq!(m.pos, 4.0);
        assert_approx_eq!(m.vel, 4.0);

        let m = acc.bounded_motion(0.0, 10.0, 1.0, 40.0);
        assert_approx_eq!(m.pos, 10.0);
    }

    #[test]
    fn bounded_motion_never_reverses() {
        let acc = model();
        let m = acc.bounded_motion(5.0, 6.0, 0.5, 2.0);
        assert_approx_eq!(m.pos, 5.0);
        assert_approx_eq!(m.vel, 0.0);
    }

    #[test]
    fn velocity_adjust_scales_top_speed() {
        let mut acc = model();
        acc.set_velocity_adjust(0.8);
        assert_approx_eq!(acc.max_vel(), 8.0);
        let m = acc.free_motion(0.0, 8.0, 1.0);
        assert_approx_eq!(m.vel, 8.0);
    }
}
