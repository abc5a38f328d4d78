//! Module configuration.

use helix::config::{ConfigError, SharedConfig};
use helix::consts::{CYCLE_TIME_US, MAX_DOF};
use serde::Deserialize;

/// TOML configuration of a simulated hardware module.
///
/// ```toml
/// [shared]
/// log_level = "info"
/// service_name = "helix-hal-sim-01"
///
/// [module]
/// name = "arm"
/// dof = 6
/// cycle_time_us = 1000
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct HalConfig {
    /// Common application fields.
    pub shared: SharedConfig,
    /// Module-specific settings.
    pub module: ModuleConfig,
}

/// Module-specific settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Module name; segments are published as `helix_<name>_<interface>`.
    pub name: String,
    /// Number of simulated joints.
    pub dof: usize,
    /// Control cycle period [µs].
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u64,
    /// First-order tracking time constant of the simulated joints [s].
    #[serde(default = "default_time_constant")]
    pub tracking_time_constant_s: f64,
}

fn default_cycle_time_us() -> u64 {
    CYCLE_TIME_US
}

fn default_time_constant() -> f64 {
    0.05
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: "arm".to_string(),
            dof: 6,
            cycle_time_us: CYCLE_TIME_US,
            tracking_time_constant_s: default_time_constant(),
        }
    }
}

impl ModuleConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "module name cannot be empty".to_string(),
            ));
        }
        if self.dof == 0 || self.dof > MAX_DOF {
            return Err(ConfigError::ValidationError(format!(
                "dof must be in 1..={MAX_DOF}, got {}",
                self.dof
            )));
        }
        if self.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ModuleConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_dof_is_rejected() {
        let config = ModuleConfig {
            dof: 0,
            ..ModuleConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn excess_dof_is_rejected() {
        let config = ModuleConfig {
            dof: MAX_DOF + 1,
            ..ModuleConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
