//! Application state shared across handlers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use awis_core::{Branding, Tenant};

use crate::backend::{BackendClient, CommerceBackend, PaymentFormTokenSource, WebPaymentPageClient};
use crate::config::StorefrontConfig;
use crate::services::ViewRegistry;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. The backend and the payment-form token
/// source are trait objects so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Arc<dyn CommerceBackend>,
    payment_form: Arc<dyn PaymentFormTokenSource>,
    views: ViewRegistry,
}

impl AppState {
    /// Create the state with HTTP clients for the configured backend.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = Arc::new(BackendClient::new(&config.backend));
        let payment_form = Arc::new(WebPaymentPageClient::new(&config.backend.web_base_url));
        Self::with_backend(config, backend, payment_form)
    }

    /// Create the state around explicit backend implementations.
    #[must_use]
    pub fn with_backend(
        config: StorefrontConfig,
        backend: Arc<dyn CommerceBackend>,
        payment_form: Arc<dyn PaymentFormTokenSource>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                payment_form,
                views: ViewRegistry::new(CancellationToken::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &dyn CommerceBackend {
        self.inner.backend.as_ref()
    }

    #[must_use]
    pub fn payment_form(&self) -> &dyn PaymentFormTokenSource {
        self.inner.payment_form.as_ref()
    }

    #[must_use]
    pub fn views(&self) -> &ViewRegistry {
        &self.inner.views
    }

    #[must_use]
    pub fn tenant(&self) -> Tenant {
        self.inner.config.tenant
    }

    #[must_use]
    pub fn branding(&self) -> &'static Branding {
        self.inner.config.tenant.branding()
    }
}
