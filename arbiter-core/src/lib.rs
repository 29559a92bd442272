//! Core shared library for the Arbiter rule service.
//!
//! This crate exposes the ambient primitives the service and the CLI
//! depend on: the canonical error type, environment configuration,
//! database pool helpers, JSON helpers and logging setup.

pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{CoreConfig, Environment};
pub use errors::{ArbiterError, ConfigError, Result as CoreResult};
