//! Platform helpers shared by the workers.

pub mod task_pin;
