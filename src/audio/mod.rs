//! JACK host for the engine.

pub mod jack;
pub mod manager;
pub mod ports;

pub use manager::Manager;

/// Client name registered with the JACK server.
pub const CLIENT_NAME: &str = "triband";
