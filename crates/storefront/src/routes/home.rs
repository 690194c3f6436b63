//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::filters;
use crate::middleware::CspNonce;
use crate::models::ShopperSession;
use crate::routes::Page;
use crate::state::AppState;

/// Support contact links shown on the home and confirmation pages.
#[derive(Clone, Default)]
pub struct ContactView {
    pub phone: Option<&'static str>,
    pub email: Option<&'static str>,
    pub whatsapp: Option<&'static str>,
    pub instagram: Option<&'static str>,
}

impl ContactView {
    #[must_use]
    pub fn for_state(state: &AppState) -> Self {
        let branding = state.branding();
        Self {
            phone: branding.phone,
            email: branding.email,
            whatsapp: branding.whatsapp,
            instagram: branding.instagram,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.email.is_none()
            && self.whatsapp.is_none()
            && self.instagram.is_none()
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub description: &'static str,
    pub contacts: ContactView,
    pub cart_count: u32,
}

/// Display the tenant's home page.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
) -> impl IntoResponse {
    let lang = session.language(state.config().default_language).await;
    let cart_count = session
        .cart()
        .await
        .map(|cart| cart.item_count())
        .unwrap_or_default();

    HomeTemplate {
        page: Page::new(&state, lang, nonce),
        description: state.branding().description,
        contacts: ContactView::for_state(&state),
        cart_count,
    }
}
