//! Handler-side authentication guards.

use crate::domain::ports::AccountQuery;
use crate::domain::{Error, User};

use super::session::SessionContext;

/// Resolve the session to a full user, or fail with `401 Unauthorized`.
///
/// A valid session pointing at a deleted account also reads as unauthorized.
pub async fn require_user(
    session: &SessionContext,
    directory: &dyn AccountQuery,
) -> Result<User, Error> {
    let user_id = session.require_user_id()?;
    directory
        .find(&user_id)
        .await?
        .ok_or_else(|| Error::unauthorized("login required"))
}

/// Like [`require_user`], additionally failing with `403 Forbidden` for
/// non-staff accounts.
pub async fn require_staff(
    session: &SessionContext,
    directory: &dyn AccountQuery,
) -> Result<User, Error> {
    let user = require_user(session, directory).await?;
    if !user.role().is_staff() {
        return Err(Error::forbidden("staff access required"));
    }
    Ok(user)
}
