//! Port traits at the domain boundary.

pub mod config_port;
pub mod position_port;
