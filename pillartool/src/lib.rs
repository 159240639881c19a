//! # pillartool
//!
//! Command-line front end that turns `--set key=value` input into pillar
//! files for a configuration-management backend.
//!
//! Each configuration domain is a component that goes through three stages:
//! build a candidate record from the arguments, validate it against its
//! subtree of the reference schema, and atomically write it to the one
//! `.sls` file it owns.
//!
//! ## Modules
//!
//! - [`args`] - Key/value argument bag
//! - [`components`] - Concrete configuration domains
//! - [`config`] - Tool configuration file
//! - [`ctx`] - Application context and path configuration
//! - [`lifecycle`] - Component contract, stages and driver

/// Key/value view of command-line input.
pub mod args;

/// Concrete configuration components.
///
/// One per domain (network, release, system), registered through
/// [`components::ComponentKind`].
pub mod components;

/// Tool configuration file (`.pillartool.toml`).
pub mod config;

/// Application context and path configuration.
pub mod ctx;

/// Component contract, stage state machine and driver.
pub mod lifecycle;

#[macro_use]
extern crate log;

pub use pillarcfg;
