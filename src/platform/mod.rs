// GuidSleuth - platform/mod.rs
//
// Platform abstraction layer: config files, subprocesses, device tooling.
// Dependencies: util, directories, serde, toml.
// Must NOT depend on: core, app.

pub mod acquire;
pub mod config;
pub mod device;
pub mod process;
