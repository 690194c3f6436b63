//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Turns a display phone number into a `tel:` link target.
///
/// Keeps a leading `+` and the digits, drops everything else.
///
/// Usage in templates: `{{ phone|tel_href }}`
#[askama::filter_fn]
pub fn tel_href(phone: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(tel_target(&phone.to_string()))
}

fn tel_target(phone: &str) -> String {
    let phone = phone.trim();
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if phone.starts_with('+') {
        format!("tel:+{digits}")
    } else {
        format!("tel:{digits}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tel_target() {
        assert_eq!(tel_target("+965 5115-3196"), "tel:+96551153196");
        assert_eq!(tel_target("22 33 44"), "tel:223344");
    }
}
