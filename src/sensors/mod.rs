pub mod service;

pub use service::{SensorPatch, SensorService};
