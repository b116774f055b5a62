//! Core domain: aggregates, the intake assistant, ports, and services.
//!
//! Nothing here knows about HTTP, sessions, or storage engines; those live
//! in the inbound and outbound adapters.

pub mod account_service;
pub mod assistant;
pub mod auth;
pub mod error;
pub mod ports;
pub mod request;
pub mod request_service;
pub mod user;

pub use account_service::AccountService;
pub use error::{Error, ErrorCode};
pub use request_service::RequestService;
pub use user::{Apartment, Email, FullName, Role, User, UserId};
