//! Simulation parameters.
//!
//! Every field has a default, so a parameter file only needs to name the
//! options it changes.

use serde::{Deserialize, Serialize};

/// Distance falloff of a repulsive wall force.
///
/// The force is the wall-to-agent offset vector scaled by
/// `constant / distance^n`, so `InverseCube` gives a magnitude of
/// `constant / distance²` and `InverseLinear` a constant magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceLaw {
    InverseLinear,
    #[default]
    InverseCube,
}

impl ForceLaw {
    pub fn exponent(self) -> i32 {
        match self {
            ForceLaw::InverseLinear => 1,
            ForceLaw::InverseCube => 3,
        }
    }
}

/// Tunable parameters for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// World width used for the initial scatter.
    pub width: f64,
    /// World height used for the initial scatter.
    pub height: f64,
    /// Ticks to simulate after the initial frame.
    pub simulation_length: usize,
    /// Speed cap applied after every force integration.
    pub max_velocity: f64,
    pub random_seed: u64,
    pub wall_force_constant: f64,
    /// Walls farther than this exert no force.
    pub wall_force_margin: f64,
    pub wall_force_law: ForceLaw,
    pub agent_force_constant: f64,
    /// Agents this far apart or farther exert no force on each other.
    pub agent_force_margin: f64,
    pub goal_force_constant: f64,
    /// Samples tried per agent before initial placement gives up.
    pub max_placement_attempts: u32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            simulation_length: 180,
            max_velocity: 0.5,
            random_seed: 0,
            wall_force_constant: 0.5,
            wall_force_margin: 1.0,
            wall_force_law: ForceLaw::InverseCube,
            agent_force_constant: 0.05,
            agent_force_margin: 1.0,
            goal_force_constant: 50.0,
            max_placement_attempts: 1000,
        }
    }
}

/// Parameter validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Scatter area must have positive, finite extent.
    InvalidBounds { width: f64, height: f64 },
    /// Velocity cap must be positive and finite.
    InvalidMaxVelocity(f64),
    /// A force margin is negative or not finite.
    InvalidMargin { name: &'static str, value: f64 },
    /// A force constant is not finite.
    InvalidConstant { name: &'static str, value: f64 },
    ZeroPlacementAttempts,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidBounds { width, height } => {
                write!(f, "world bounds must be positive, got {}×{}", width, height)
            }
            ConfigError::InvalidMaxVelocity(v) => {
                write!(f, "max_velocity must be positive and finite, got {}", v)
            }
            ConfigError::InvalidMargin { name, value } => {
                write!(f, "{} must be non-negative and finite, got {}", name, value)
            }
            ConfigError::InvalidConstant { name, value } => {
                write!(f, "{} must be finite, got {}", name, value)
            }
            ConfigError::ZeroPlacementAttempts => {
                write!(f, "max_placement_attempts must be at least 1")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl SimParams {
    /// Check every field, returning all problems found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.width) || !positive(self.height) {
            errors.push(ConfigError::InvalidBounds {
                width: self.width,
                height: self.height,
            });
        }
        if !positive(self.max_velocity) {
            errors.push(ConfigError::InvalidMaxVelocity(self.max_velocity));
        }
        for (name, value) in [
            ("wall_force_margin", self.wall_force_margin),
            ("agent_force_margin", self.agent_force_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::InvalidMargin { name, value });
            }
        }
        for (name, value) in [
            ("wall_force_constant", self.wall_force_constant),
            ("agent_force_constant", self.agent_force_constant),
            ("goal_force_constant", self.goal_force_constant),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::InvalidConstant { name, value });
            }
        }
        if self.max_placement_attempts == 0 {
            errors.push(ConfigError::ZeroPlacementAttempts);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimParams::default().validate().is_empty());
        assert_eq!(SimParams::default().wall_force_law, ForceLaw::InverseCube);
    }

    #[test]
    fn collects_every_error() {
        let params = SimParams {
            width: 0.0,
            max_velocity: f64::NAN,
            agent_force_margin: -1.0,
            goal_force_constant: f64::INFINITY,
            max_placement_attempts: 0,
            ..SimParams::default()
        };
        let errors = params.validate();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(errors.contains(&ConfigError::ZeroPlacementAttempts));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidMargin { name: "agent_force_margin", .. })));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let params: SimParams =
            serde_json::from_str(r#"{"simulation_length": 12, "wall_force_law": "inverse_linear"}"#)
                .unwrap();
        assert_eq!(params.simulation_length, 12);
        assert_eq!(params.wall_force_law.exponent(), 1);
        assert_eq!(params.width, 100.0);
    }
}
