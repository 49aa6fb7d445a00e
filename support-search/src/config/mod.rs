//! Configuration module for the support search binary.

pub mod dependencies;
pub mod settings;

pub use dependencies::Dependencies;
pub use settings::{ConfigError, LogFormat, Settings};
