//! Adapters: concrete implementations of the ports.

pub mod ai;
pub mod flights;
pub mod locations;
pub mod memory;
pub mod outbound;
