//! Measurement front-ends implementing [`MeasurementPort`](crate::app::ports::MeasurementPort).

pub mod ina226;

pub use ina226::Ina226;
