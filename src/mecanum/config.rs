//! Configuration for the mecanum motion environment.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::env::ConfigError;

use super::geometry::{Point, Polygon};
use super::DrivetrainParams;

/// Configuration for [`MecanumEnv`](super::MecanumEnv).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MecanumEnvConfig {
    /// Seed of the first episode; later resets use seed + 1, + 2, ...
    pub seed: u64,

    // --- Field ---
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Convex obstacles, one vertex list `(x, y)` each.
    pub roadblocks: Vec<Vec<(f64, f64)>>,

    // --- Robot ---
    pub drivetrain: DrivetrainParams,

    // --- Clock ---
    /// Step index at which the episode times out.
    pub max_time: u32,
    /// Simulated seconds per step.
    pub timestep: f64,
}

impl Default for MecanumEnvConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            min_x: 0.0,
            max_x: 144.0,
            min_y: 0.0,
            max_y: 144.0,
            roadblocks: Vec::new(),
            drivetrain: DrivetrainParams::default(),
            max_time: 1000,
            timestep: 0.05,
        }
    }
}

impl MecanumEnvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, min, max) in [('x', self.min_x, self.max_x), ('y', self.min_y, self.max_y)] {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::InvalidBounds { axis, min, max });
            }
        }
        for (index, vertices) in self.roadblocks.iter().enumerate() {
            let finite = vertices.iter().all(|(x, y)| x.is_finite() && y.is_finite());
            if vertices.len() < 3 || !finite {
                return Err(ConfigError::InvalidRoadblock {
                    index,
                    vertices: vertices.len(),
                });
            }
        }
        self.drivetrain.validate()?;
        if self.max_time == 0 {
            return Err(ConfigError::ZeroMaxTime);
        }
        if !self.timestep.is_finite() || self.timestep <= 0.0 {
            return Err(ConfigError::InvalidTimestep(self.timestep));
        }
        Ok(())
    }

    /// The field rectangle.
    pub fn bounds(&self) -> Polygon {
        Polygon::rectangle(
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.max_y),
        )
    }

    pub fn roadblock_polygons(&self) -> Vec<Polygon> {
        self.roadblocks
            .iter()
            .map(|vertices| {
                Polygon::new(vertices.iter().map(|&(x, y)| Point::new(x, y)).collect())
            })
            .collect()
    }

    /// Parses and validates a configuration from JSON. Missing fields
    /// take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = MecanumEnvConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.bounds().area(), 144.0 * 144.0);
    }

    #[test]
    fn rejects_inverted_bounds() {
        let cfg = MecanumEnvConfig {
            min_y: 10.0,
            max_y: 10.0,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidBounds {
                axis: 'y',
                min: 10.0,
                max: 10.0
            })
        );
    }

    #[test]
    fn rejects_degenerate_roadblock() {
        let cfg = MecanumEnvConfig {
            roadblocks: vec![
                vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)],
                vec![(0.0, 0.0), (1.0, 0.0)],
            ],
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidRoadblock {
                index: 1,
                vertices: 2
            })
        );
    }

    #[test]
    fn rejects_bad_clock_and_drivetrain() {
        let cfg = MecanumEnvConfig {
            max_time: 0,
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMaxTime));

        let cfg = MecanumEnvConfig {
            timestep: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTimestep(_))));

        let mut cfg = MecanumEnvConfig::default();
        cfg.drivetrain.wheel_radius = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDrivetrain {
                name: "wheel_radius",
                ..
            })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_roadblocks() {
        let cfg = MecanumEnvConfig::from_json_str(
            r#"{"max_time": 50, "roadblocks": [[[60, 60], [80, 60], [80, 80], [60, 80]]]}"#,
        )
        .unwrap();
        assert_eq!(cfg.max_time, 50);
        assert_eq!(cfg.roadblock_polygons()[0].area(), 400.0);
        assert_eq!(cfg.drivetrain, DrivetrainParams::default());
    }
}
