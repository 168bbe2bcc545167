use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "no-referrer";
// Payment confirmations and fee figures must not be served from a cache.
const CACHE_CONTROL_VALUE: &str = "no-store";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Response headers set on every API response.
pub fn security_headers(include_hsts: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF)),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static(DENY)),
        (
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CSP_API_VALUE),
        ),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static(REFERRER_POLICY_VALUE),
        ),
        (
            header::CACHE_CONTROL,
            HeaderValue::from_static(CACHE_CONTROL_VALUE),
        ),
    ];

    // Only meaningful behind HTTPS.
    if include_hsts {
        headers.push((
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        ));
    }

    headers
}

pub fn with_security_headers<S>(router: Router<S>, include_hsts: bool) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if include_hsts {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }

    security_headers(include_hsts)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}
