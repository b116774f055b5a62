//! Outbound adapters implementing the driven ports.

pub mod persistence;
pub mod photos;
