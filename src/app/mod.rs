//! Application core: domain orchestration behind port traits.
//!
//! The supervisor service, the built-in pack handlers and the worker
//! loops live here.  All interaction with hardware happens through the
//! traits in [`ports`], keeping this layer testable without peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
