//! Application configuration loaded from TOML.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "pretty"
//!
//! [solver]
//! backend = "native"
//! threads = 4
//! time_limit = 30.0
//! ```

use super::logging::LoggingConfig;
use crate::application::InstanceFile;
use crate::domain::{SolverBackend, SolverConfig, TieBreak};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Solver section of the configuration file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub backend: SolverBackend,
    /// Wall-clock limit in seconds
    pub time_limit: Option<f64>,
    pub node_limit: Option<u64>,
    pub threads: usize,
    pub tie_break: TieBreak,
    pub integrality_tolerance: f64,
    pub verbose: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let defaults = SolverConfig::default();
        Self {
            backend: defaults.backend,
            time_limit: defaults.time_limit,
            node_limit: defaults.node_limit,
            threads: defaults.threads,
            tie_break: defaults.tie_break,
            integrality_tolerance: defaults.integrality_tolerance,
            verbose: defaults.verbose,
        }
    }
}

impl SolverSettings {
    pub fn to_solver_config(&self) -> SolverConfig {
        SolverConfig {
            backend: self.backend,
            time_limit: self.time_limit,
            node_limit: self.node_limit,
            threads: self.threads,
            tie_break: self.tie_break,
            integrality_tolerance: self.integrality_tolerance,
            verbose: self.verbose,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub solver: SolverSettings,
}

impl AppConfig {
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            what: "configuration",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse_toml(&read(path.as_ref())?)
    }

    /// Range checks; the solver repeats them before every solve
    pub fn validate(&self) -> Result<()> {
        let solver = &self.solver;
        if solver.threads == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solver.threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(limit) = solver.time_limit {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: "solver.time_limit",
                    reason: format!("must be a positive number of seconds, got {}", limit),
                });
            }
        }
        let tol = solver.integrality_tolerance;
        if !(tol > 0.0 && tol < 0.5) {
            return Err(ConfigError::InvalidValue {
                field: "solver.integrality_tolerance",
                reason: format!("must lie in (0, 0.5), got {}", tol),
            });
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("expected \"pretty\" or \"json\", got \"{}\"", self.logging.format),
            });
        }
        Ok(())
    }
}

/// Parse a supply-chain instance in TOML form
pub fn parse_instance(content: &str) -> Result<InstanceFile> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        what: "instance",
        source,
    })
}

pub fn load_instance<P: AsRef<Path>>(path: P) -> Result<InstanceFile> {
    parse_instance(&read(path.as_ref())?)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.solver.threads, 1);
        assert_eq!(config.solver.backend, SolverBackend::Native);
        assert_eq!(config.solver.tie_break, TieBreak::Lexicographic);
    }

    #[test]
    fn test_solver_section() {
        let config = AppConfig::parse_toml(
            r#"
            [logging]
            level = "debug"
            format = "json"

            [solver]
            backend = "highs"
            threads = 4
            time_limit = 2.5
            node_limit = 1000
            tie_break = "first_found"
            "#,
        )
        .unwrap();

        let solver = config.solver.to_solver_config();
        assert_eq!(solver.backend, SolverBackend::Highs);
        assert_eq!(solver.threads, 4);
        assert_eq!(solver.time_limit, Some(2.5));
        assert_eq!(solver.node_limit, Some(1000));
        assert_eq!(solver.tie_break, TieBreak::FirstFound);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::parse_toml("[solver]\nthreads = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "solver.threads",
                ..
            }
        ));

        let err = AppConfig::parse_toml("[logging]\nformat = \"xml\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = AppConfig::parse_toml("[solver]\nthreads = \"many\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { what: "configuration", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("/nonexistent/coffeeflow.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_instance_tables() {
        let instance = parse_instance(
            r#"
            products = ["light"]

            [[suppliers]]
            name = "s1"
            capacity = 10

            [[roasteries]]
            name = "r1"
            roasting_cost = { light = 3 }

            [[cafes]]
            name = "c1"
            demand = { light = 4 }

            [[supply_routes]]
            from = "s1"
            to = "r1"
            cost = 2

            [[delivery_routes]]
            from = "r1"
            to = "c1"
            cost = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(instance.suppliers[0].capacity, 10.0);
        assert_eq!(instance.roasteries[0].roasting_cost["light"], 3.0);
        assert_eq!(instance.delivery_routes[0].cost, 1.5);
    }
}
