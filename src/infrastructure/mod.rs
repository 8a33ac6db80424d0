// Infrastructure: configuration, logging and the command-line run

pub mod config;
pub mod logging;
pub mod runner;

pub use config::{AppConfig, ConfigError, SolverSettings};
pub use logging::LoggingConfig;
pub use runner::{run, InstanceSource, RunConfig};
