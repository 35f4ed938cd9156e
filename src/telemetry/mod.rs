pub mod service;

pub use service::{local_now, parse_reading_date, ReadingInput, TelemetryService};
