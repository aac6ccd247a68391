//! Weather API: current conditions and forecasts by city name.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod providers;
pub mod storage;
pub mod types;
pub mod upstream;
