//! # Mediator Runtime Library
//!
//! Exposes the runtime wiring for the binary and for integration tests.
//!
//! - `config/` - layered [`MediatorConfig`] (TOML, environment, validation)
//! - `bootstrap/` - builtin network creation and primary selection
//! - `mediator/` - the [`Mediator`] facade owning every subsystem

pub mod bootstrap;
pub mod config;
pub mod mediator;

pub use bootstrap::{bootstrap_networks, BootstrapReport};
pub use config::{BuiltinNetwork, ConfigError, MediatorConfig, TelemetrySettings};
pub use mediator::{parse_request, Mediator};
