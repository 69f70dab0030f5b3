//! Lumen firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pack;
pub mod pins;
pub mod supervisor;

pub mod adapters;
pub mod drivers;
pub mod sensors;
