//! Per-guest checkout view tokens.
//!
//! Each guest has one current checkout view. Navigation that replaces the
//! view (address submit, back, order completion) cancels the old view's
//! token, and any work still running for it must not touch the session or
//! redirect once its token is cancelled.

use std::time::Duration;

use moka::future::Cache;
use tokio_util::sync::CancellationToken;

use awis_core::GuestId;

/// Views with no activity for this long are forgotten.
const VIEW_IDLE: Duration = Duration::from_secs(60 * 60);

const MAX_VIEWS: u64 = 100_000;

/// Current view token per guest, all children of one root token.
#[derive(Clone)]
pub struct ViewRegistry {
    views: Cache<GuestId, CancellationToken>,
    root: CancellationToken,
}

impl ViewRegistry {
    #[must_use]
    pub fn new(root: CancellationToken) -> Self {
        Self {
            views: Cache::builder()
                .max_capacity(MAX_VIEWS)
                .time_to_idle(VIEW_IDLE)
                .build(),
            root,
        }
    }

    /// Cancel the guest's current view and start a new one.
    pub async fn supersede(&self, guest: &GuestId) -> CancellationToken {
        let next = self.root.child_token();
        if let Some(previous) = self.views.get(guest).await {
            previous.cancel();
            tracing::debug!(guest = %guest, "Superseded checkout view");
        }
        self.views.insert(guest.clone(), next.clone()).await;
        next
    }

    /// The guest's current view, starting one if none exists.
    pub async fn current(&self, guest: &GuestId) -> CancellationToken {
        let root = self.root.clone();
        self.views
            .get_with(guest.clone(), async move { root.child_token() })
            .await
    }

    /// Cancel every view.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}
