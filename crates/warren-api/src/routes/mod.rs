//! Route handlers.

pub mod health;
pub mod license;
pub mod provision;
pub mod tunnels;
