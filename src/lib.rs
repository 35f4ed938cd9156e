pub mod aggregation;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod sensors;
pub mod telemetry;
pub mod users;
