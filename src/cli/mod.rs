//! Headless driver for the session layer: parses arguments, initializes
//! logging, and runs the selected action.

pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod globals;
mod start;
mod telemetry;

pub use start::start;
