//! Data structures for sensor data.

pub mod reading;

pub use reading::{Reading, SensorSample};
