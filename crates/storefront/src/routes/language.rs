//! Display language switch.

use axum::{
    extract::{Path, Query},
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use awis_core::Language;

use crate::error::{AppError, Result};
use crate::models::ShopperSession;

#[derive(Debug, Deserialize)]
pub struct SwitchQuery {
    /// Local path to return to.
    pub next: Option<String>,
}

/// Only same-site absolute paths are followed.
fn safe_return_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

/// Store the chosen language and go back.
#[instrument(skip(session))]
pub async fn switch(
    session: ShopperSession,
    Path(code): Path<String>,
    Query(query): Query<SwitchQuery>,
) -> Result<Redirect> {
    let lang = Language::from_code(&code)
        .ok_or_else(|| AppError::NotFound(format!("language '{code}'")))?;
    session.set_language(lang).await?;
    Ok(Redirect::to(safe_return_path(query.next.as_deref())))
}
