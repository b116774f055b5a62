//! Persistence adapters.

pub mod memory;
