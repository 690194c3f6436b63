//! Return from the hosted payment gateway.
//!
//! The gateway appends `flag` (and for some gateways `token`) to the
//! configured callback URL. Only sessions that actually left for a payment
//! page are handled; anything else goes home.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use awis_core::{LocalCart, Message, WizardEvent};

use crate::error::{Result, add_breadcrumb};
use crate::labels::Labels;
use crate::middleware::CspNonce;
use crate::models::ShopperSession;
use crate::routes::Page;
use crate::routes::home::ContactView;
use crate::routes::order_success::OrderSuccessTemplate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub flag: Option<String>,
    pub token: Option<String>,
}

/// Handle the gateway's return.
#[instrument(skip(state, session, nonce))]
pub async fn callback(
    State(state): State<AppState>,
    session: ShopperSession,
    nonce: CspNonce,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    if !session.take_payment_attempt().await? {
        return Ok(Redirect::to("/").into_response());
    }
    let lang = session.language(state.config().default_language).await;
    let wizard = session.wizard().await?;

    if query.flag.as_deref() != Some("success") {
        tracing::info!(flag = ?query.flag, "Payment not completed");
        session
            .save_wizard(&wizard.apply(WizardEvent::SubmissionFailed(
                Message::PaymentNotCompleted,
            )))
            .await?;
        return Ok(Redirect::to("/checkout").into_response());
    }

    if let Some(guest) = session.guest_id().await? {
        state.views().supersede(&guest).await;
    }
    session.save_cart(&LocalCart::new()).await?;
    session
        .save_wizard(&wizard.apply(WizardEvent::OrderCompleted))
        .await?;

    let order_id = query
        .token
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(order = %order_id, "Digital payment completed");
    add_breadcrumb("checkout", "Payment completed", Some(&[("order_id", &order_id)]));

    Ok(OrderSuccessTemplate {
        page: Page::new(&state, lang, nonce),
        order_id,
        total: None,
        payment: Some(Labels::for_language(lang).online_payment.to_string()),
        contacts: ContactView::for_state(&state),
    }
    .into_response())
}
