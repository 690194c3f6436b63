//! Guest identity bootstrap.

use tracing::instrument;

use awis_core::{GuestId, Message};

use crate::backend::CommerceBackend;
use crate::error::set_sentry_guest;
use crate::models::ShopperSession;

/// Return the session's guest id, asking the backend for one on first use.
///
/// The id is written once and never replaced. Any failure is reported as
/// the blocking bootstrap message; there is no retry.
///
/// # Errors
///
/// Returns [`Message::GuestBootstrapFailed`] when the session store or the
/// backend fails.
#[instrument(skip_all)]
pub async fn ensure_guest(
    backend: &dyn CommerceBackend,
    session: &ShopperSession,
) -> Result<GuestId, Message> {
    match session.guest_id().await {
        Ok(Some(guest)) => {
            set_sentry_guest(&guest);
            return Ok(guest);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read guest id from session");
            return Err(Message::GuestBootstrapFailed);
        }
    }

    let guest = backend.create_guest().await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to obtain guest id");
        Message::GuestBootstrapFailed
    })?;

    session.set_guest_id(&guest).await.map_err(|e| {
        tracing::warn!(error = %e, "Failed to store guest id");
        Message::GuestBootstrapFailed
    })?;

    tracing::info!(guest = %guest, "Issued guest id");
    set_sentry_guest(&guest);
    Ok(guest)
}
