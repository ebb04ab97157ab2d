//! Mecanum drivetrain kinematics and the motion environment built on it.
//!
//! Wheels are numbered front left, front right, back left, back right, with
//! rollers at π/4, 3π/4, −3π/4 and −π/4. Distances are in inches, wheel
//! speeds in rotations per second.

pub mod config;
pub mod env;
pub mod geometry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::env::ConfigError;

pub use config::MecanumEnvConfig;
pub use env::{MecanumEnv, MecanumStepInfo, MotionOutcome};
pub use geometry::{Point, Polygon};

/// Physical constants of a four-wheel mecanum drivetrain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DrivetrainParams {
    /// Top wheel speed (rotations/s).
    pub max_wheel_velocity: f64,
    /// Largest change of wheel speed per second (rotations/s²).
    pub wheel_acceleration: f64,
    pub wheel_radius: f64,
    /// Distance between the left and right wheels.
    pub track_width: f64,
    /// Distance between the front and back wheels.
    pub wheelbase_length: f64,
}

impl Default for DrivetrainParams {
    fn default() -> Self {
        Self {
            max_wheel_velocity: 5.0,
            wheel_acceleration: 10.0,
            wheel_radius: 2.0,
            track_width: 14.0,
            wheelbase_length: 14.0,
        }
    }
}

impl DrivetrainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_wheel_velocity", self.max_wheel_velocity),
            ("wheel_radius", self.wheel_radius),
            ("track_width", self.track_width),
            ("wheelbase_length", self.wheelbase_length),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidDrivetrain {
                    name,
                    requirement: "positive and finite",
                    value,
                });
            }
        }
        if !self.wheel_acceleration.is_finite() || self.wheel_acceleration < 0.0 {
            return Err(ConfigError::InvalidDrivetrain {
                name: "wheel_acceleration",
                requirement: "non-negative and finite",
                value: self.wheel_acceleration,
            });
        }
        Ok(())
    }
}

/// Position of the robot centre and its heading in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Self { x, y, theta }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A mecanum robot: pose, wheel state and footprint.
#[derive(Debug, Clone)]
pub struct Mecanum {
    pub params: DrivetrainParams,
    pose: Pose,
    wheel_velocities: [f64; 4],
    footprint: Polygon,
    previous: Option<Pose>,
}

impl Mecanum {
    /// A robot at rest at `pose`.
    pub fn new(params: DrivetrainParams, pose: Pose) -> Self {
        Self {
            footprint: footprint_at(&params, &pose),
            params,
            pose,
            wheel_velocities: [0.0; 4],
            previous: None,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn wheel_velocities(&self) -> [f64; 4] {
        self.wheel_velocities
    }

    /// Rectangle of wheelbase length by track width around the pose.
    pub fn footprint(&self) -> &Polygon {
        &self.footprint
    }

    /// Advances the robot by `dt` seconds under controller inputs.
    ///
    /// `power`, `strafe` and `turn` are stick values; their combined
    /// magnitude is normalised to at most one before mixing.
    pub fn drive(&mut self, power: f64, strafe: f64, turn: f64, dt: f64) {
        self.previous = Some(self.pose);

        let demand = wheel_demand(power, strafe, turn, self.params.max_wheel_velocity);
        let max_step = self.params.wheel_acceleration * dt;
        for (v, target) in self.wheel_velocities.iter_mut().zip(demand) {
            if (target - *v).abs() <= max_step {
                *v = target;
            } else if target < *v {
                *v -= max_step;
            } else {
                *v += max_step;
            }
        }

        let [m0, m1, m2, m3] = self.wheel_velocities;
        let r = self.params.wheel_radius;
        let v_forward = (m0 + m1 + m2 + m3) * r / 4.0;
        let v_strafe = (-m0 + m1 + m2 - m3) * r / 4.0;
        let omega = (-m0 + m1 - m2 + m3) * r
            / (2.0 * (self.params.track_width + self.params.wheelbase_length));

        // Heading first, then position with the new heading.
        let pose = &mut self.pose;
        pose.theta += omega * dt;
        let (sin, cos) = pose.theta.sin_cos();
        pose.x += (v_forward * cos - v_strafe * sin) * dt;
        pose.y += (v_forward * sin + v_strafe * cos) * dt;

        self.footprint = footprint_at(&self.params, &self.pose);
    }

    /// Restores the pose from before the last [`Mecanum::drive`]. Only one
    /// level is kept; returns false when there is nothing to undo.
    pub fn revert(&mut self) -> bool {
        match self.previous.take() {
            Some(pose) => {
                self.pose = pose;
                self.footprint = footprint_at(&self.params, &self.pose);
                true
            }
            None => false,
        }
    }

    /// Whether `point` lies strictly inside the footprint.
    pub fn contains_point(&self, point: &Point) -> bool {
        self.footprint.contains_point(point)
    }

    /// Whether the footprint overlaps any of `obstacles`.
    pub fn clips(&self, obstacles: &[Polygon]) -> bool {
        obstacles.iter().any(|o| self.footprint.overlaps(o))
    }

    /// Whether the footprint is not strictly inside `bounds`.
    pub fn out_of_bounds(&self, bounds: &Polygon) -> bool {
        !bounds.contains_properly(&self.footprint)
    }
}

/// Demanded wheel speeds for the given stick inputs.
fn wheel_demand(power: f64, strafe: f64, turn: f64, max_velocity: f64) -> [f64; 4] {
    let denom = (power.abs() + strafe.abs() + turn.abs()).max(1.0);
    let scale = max_velocity / denom;
    [
        (power + strafe + turn) * scale,
        (power - strafe - turn) * scale,
        (power - strafe + turn) * scale,
        (power + strafe - turn) * scale,
    ]
}

fn footprint_at(params: &DrivetrainParams, pose: &Pose) -> Polygon {
    Polygon::oriented_rectangle(
        pose.position(),
        params.wheelbase_length,
        params.track_width,
        pose.theta,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn robot() -> Mecanum {
        Mecanum::new(DrivetrainParams::default(), Pose::new(72.0, 72.0, 0.0))
    }

    #[test]
    fn zero_acceleration_never_changes_wheels() {
        let mut r = Mecanum::new(
            DrivetrainParams {
                wheel_acceleration: 0.0,
                ..Default::default()
            },
            Pose::new(72.0, 72.0, 0.0),
        );
        for _ in 0..10 {
            r.drive(1.0, 0.5, -0.5, 0.05);
            assert_eq!(r.wheel_velocities(), [0.0; 4]);
        }
        assert_eq!(r.pose(), Pose::new(72.0, 72.0, 0.0));
    }

    #[test]
    fn slew_is_bounded_then_exact() {
        let mut r = robot();
        // 10 rot/s² over 0.1 s allows 1 rot/s per tick.
        r.drive(1.0, 0.0, 0.0, 0.1);
        assert_eq!(r.wheel_velocities(), [1.0; 4]);
        for _ in 0..3 {
            r.drive(1.0, 0.0, 0.0, 0.1);
        }
        assert_eq!(r.wheel_velocities(), [4.0; 4]);
        r.drive(0.9, 0.0, 0.0, 0.1);
        assert!(r.wheel_velocities().iter().all(|v| (v - 4.5).abs() < 1e-12));
    }

    #[test]
    fn inputs_are_normalised() {
        let d = wheel_demand(1.0, 1.0, 0.0, 5.0);
        assert_eq!(d, [5.0, 0.0, 0.0, 5.0]);
        let d = wheel_demand(0.2, 0.0, 0.0, 5.0);
        assert!(d.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn forward_drive_moves_along_heading() {
        let mut r = Mecanum::new(
            DrivetrainParams {
                wheel_acceleration: 1000.0,
                ..Default::default()
            },
            Pose::new(72.0, 72.0, std::f64::consts::FRAC_PI_2),
        );
        r.drive(1.0, 0.0, 0.0, 0.1);
        let p = r.pose();
        // 5 rot/s × 2 in for 0.1 s.
        assert!((p.x - 72.0).abs() < 1e-9);
        assert!((p.y - 73.0).abs() < 1e-9);
        assert_eq!(p.theta, std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn pure_turn_rotates_in_place() {
        let mut r = Mecanum::new(
            DrivetrainParams {
                wheel_acceleration: 1000.0,
                ..Default::default()
            },
            Pose::new(72.0, 72.0, 0.0),
        );
        r.drive(0.0, 0.0, -1.0, 0.1);
        let p = r.pose();
        assert!((p.x - 72.0).abs() < 1e-9 && (p.y - 72.0).abs() < 1e-9);
        // ω = 4 × 5 × 2 / (2 × 28)
        assert!((p.theta - 0.1 * 40.0 / 56.0).abs() < 1e-9);
    }

    #[test]
    fn revert_is_single_level() {
        let mut r = robot();
        assert!(!r.revert());
        r.drive(1.0, 0.0, 0.0, 0.5);
        r.drive(1.0, 0.0, 0.0, 0.5);
        let middle = {
            let mut m = robot();
            m.drive(1.0, 0.0, 0.0, 0.5);
            m.pose()
        };
        assert!(r.revert());
        assert_eq!(r.pose(), middle);
        assert!(!r.revert());
        assert_eq!(r.footprint(), robot_at(middle).footprint());
    }

    fn robot_at(pose: Pose) -> Mecanum {
        Mecanum::new(DrivetrainParams::default(), pose)
    }

    #[test]
    fn footprint_queries() {
        let r = robot();
        assert!(r.contains_point(&Point::new(78.0, 72.0)));
        assert!(!r.contains_point(&Point::new(80.0, 72.0)));

        let field = Polygon::rectangle(Point::new(0.0, 0.0), Point::new(144.0, 144.0));
        assert!(!r.out_of_bounds(&field));
        let corner = robot_at(Pose::new(7.0, 72.0, 0.0));
        assert!(corner.out_of_bounds(&field));

        let block = Polygon::rectangle(Point::new(75.0, 60.0), Point::new(90.0, 90.0));
        assert!(r.clips(&[block]));
        assert!(!r.clips(&[]));
    }
}
