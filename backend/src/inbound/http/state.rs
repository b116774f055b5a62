//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, AccountQuery, RequestCommand, RequestQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration and login.
    pub accounts: Arc<dyn AccountCommand>,
    /// Account lookups for session resolution and name display.
    pub directory: Arc<dyn AccountQuery>,
    /// Request submission and staff mutations.
    pub intake: Arc<dyn RequestCommand>,
    /// Request listings, detail, and stats.
    pub board: Arc<dyn RequestQuery>,
}

impl HttpState {
    /// Bundle the four ports the handlers need.
    pub fn new(
        accounts: Arc<dyn AccountCommand>,
        directory: Arc<dyn AccountQuery>,
        intake: Arc<dyn RequestCommand>,
        board: Arc<dyn RequestQuery>,
    ) -> Self {
        Self {
            accounts,
            directory,
            intake,
            board,
        }
    }
}
