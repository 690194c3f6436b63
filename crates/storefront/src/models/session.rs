//! Session-held shopper state.
//!
//! Everything the checkout remembers between requests lives in the
//! tower-sessions record: the guest id, the wizard, the local cart, the
//! chosen language and two navigation flags. Nothing here outlives the
//! session.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use tower_sessions::Session;

use awis_core::{CheckoutWizard, GuestId, Language, LocalCart};

type SessionResult<T> = Result<T, tower_sessions::session::Error>;

/// Session keys for shopper data.
pub mod keys {
    /// Guest id issued by the backend; written once per session.
    pub const GUEST_ID: &str = "guest_id";

    /// Checkout wizard state.
    pub const CHECKOUT: &str = "checkout";

    /// Local cart contents.
    pub const CART: &str = "cart";

    /// Display language chosen by the shopper.
    pub const LANGUAGE: &str = "language";

    /// Set while the shopper is away on a hosted payment page.
    pub const RECENT_PAYMENT_ATTEMPT: &str = "recent_payment_attempt";

    /// Set between a cash-on-delivery order and the cart being cleared, so
    /// the empty-cart redirect does not fire.
    pub const NAVIGATING_TO_SUCCESS: &str = "navigating_to_success";
}

/// Typed view over the shopper's session.
#[derive(Clone, Debug)]
pub struct ShopperSession {
    session: Session,
}

impl ShopperSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The underlying session, for persisting from detached tasks.
    #[must_use]
    pub const fn inner(&self) -> &Session {
        &self.session
    }

    /// The stored guest id, if one was issued.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn guest_id(&self) -> SessionResult<Option<GuestId>> {
        self.session.get(keys::GUEST_ID).await
    }

    /// Store a freshly issued guest id.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_guest_id(&self, guest: &GuestId) -> SessionResult<()> {
        self.session.insert(keys::GUEST_ID, guest).await
    }

    /// The wizard, starting fresh when none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn wizard(&self) -> SessionResult<CheckoutWizard> {
        Ok(self.session.get(keys::CHECKOUT).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_wizard(&self, wizard: &CheckoutWizard) -> SessionResult<()> {
        self.session.insert(keys::CHECKOUT, wizard).await
    }

    /// The local cart, empty when none is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn cart(&self) -> SessionResult<LocalCart> {
        Ok(self.session.get(keys::CART).await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save_cart(&self, cart: &LocalCart) -> SessionResult<()> {
        self.session.insert(keys::CART, cart).await
    }

    /// The shopper's language, or `default` when unset or unreadable.
    pub async fn language(&self, default: Language) -> Language {
        self.session
            .get(keys::LANGUAGE)
            .await
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_language(&self, lang: Language) -> SessionResult<()> {
        self.session.insert(keys::LANGUAGE, lang).await
    }

    /// Remember that the shopper left for a hosted payment page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn mark_payment_attempt(&self) -> SessionResult<()> {
        self.session.insert(keys::RECENT_PAYMENT_ATTEMPT, true).await
    }

    /// Read and clear the payment-attempt flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn take_payment_attempt(&self) -> SessionResult<bool> {
        Ok(self
            .session
            .remove::<bool>(keys::RECENT_PAYMENT_ATTEMPT)
            .await?
            .unwrap_or(false))
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn set_navigating_to_success(&self, navigating: bool) -> SessionResult<()> {
        if navigating {
            self.session.insert(keys::NAVIGATING_TO_SUCCESS, true).await
        } else {
            self.session
                .remove::<bool>(keys::NAVIGATING_TO_SUCCESS)
                .await
                .map(|_| ())
        }
    }

    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn navigating_to_success(&self) -> SessionResult<bool> {
        Ok(self
            .session
            .get(keys::NAVIGATING_TO_SUCCESS)
            .await?
            .unwrap_or(false))
    }
}

impl<S> FromRequestParts<S> for ShopperSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Session layer is not installed",
            ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> ShopperSession {
        ShopperSession::new(Session::new(None, Arc::new(MemoryStore::default()), None))
    }

    #[tokio::test]
    async fn test_fresh_session_defaults() {
        let session = session();
        assert_eq!(session.guest_id().await.unwrap(), None);
        assert_eq!(session.wizard().await.unwrap(), CheckoutWizard::default());
        assert!(session.cart().await.unwrap().is_empty());
        assert_eq!(session.language(Language::Ar).await, Language::Ar);
        assert!(!session.navigating_to_success().await.unwrap());
    }

    #[tokio::test]
    async fn test_payment_attempt_is_taken_once() {
        let session = session();
        session.mark_payment_attempt().await.unwrap();
        assert!(session.take_payment_attempt().await.unwrap());
        assert!(!session.take_payment_attempt().await.unwrap());
    }

    #[tokio::test]
    async fn test_navigation_flag_clears() {
        let session = session();
        session.set_navigating_to_success(true).await.unwrap();
        assert!(session.navigating_to_success().await.unwrap());
        session.set_navigating_to_success(false).await.unwrap();
        assert!(!session.navigating_to_success().await.unwrap());
    }
}
