//! Security headers middleware.
//!
//! Locked-down defaults for a page that only renders forms. Two things are
//! loosened: inline code carrying the request's CSP nonce, and form
//! submission to HTTPS origins, since checkout ends with a POST that lands on
//! an external payment page (directly or via redirect).

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Content security policy for a response rendered with `nonce`.
#[must_use]
pub fn content_security_policy(nonce: Option<&CspNonce>) -> String {
    let inline = nonce
        .map(|n| format!(" 'nonce-{}'", n.value()))
        .unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'self'{inline}; \
         style-src 'self'{inline}; \
         img-src 'self' data: https:; \
         font-src 'self'; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' https:; \
         frame-ancestors 'none'"
    )
}

fn insert_static(headers: &mut HeaderMap, name: &'static str, value: &'static str) {
    headers.insert(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    );
}

/// Add security headers to all responses.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: no-referrer`
/// - `Content-Security-Policy` (see [`content_security_policy`])
/// - `Permissions-Policy` denying sensors, camera, microphone and payment APIs
/// - `Cache-Control: no-store` (pages carry checkout state)
/// - `Cross-Origin-Opener-Policy: same-origin`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let policy = content_security_policy(response.extensions().get::<CspNonce>());
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    if let Ok(value) = HeaderValue::from_str(&policy) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }
    insert_static(
        headers,
        "permissions-policy",
        "accelerometer=(), camera=(), geolocation=(), gyroscope=(), \
         magnetometer=(), microphone=(), payment=(), usb=()",
    );
    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }
    insert_static(headers, "cross-origin-opener-policy", "same-origin");

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_without_nonce() {
        let policy = content_security_policy(None);
        assert!(policy.contains("script-src 'self';"));
        assert!(policy.contains("form-action 'self' https:"));
    }

    #[test]
    fn test_policy_allows_nonce() {
        let nonce = CspNonce::generate();
        let policy = content_security_policy(Some(&nonce));
        assert!(policy.contains(&format!("script-src 'self' 'nonce-{}'", nonce.value())));
        assert!(policy.contains(&format!("style-src 'self' 'nonce-{}'", nonce.value())));
    }
}
