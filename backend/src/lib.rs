//! Домовой backend: session-authenticated intake and triage of building
//! maintenance requests.
//!
//! Layout follows a hexagonal shape: `domain` holds aggregates, the scripted
//! intake assistant, ports, and services; `inbound::http` is the REST
//! adapter; `outbound` holds the storage adapters; `server` wires the app.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::trace::Trace;
