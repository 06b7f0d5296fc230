use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use storegate_auth::Authenticator;

use crate::app::errors;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Authenticator,
}

/// Resolve the session cookie to an [`Identity`](storegate_auth::Identity)
/// and attach it to the request, or answer with the rejection.
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookies = cookie_header(req.headers());

    match state.authenticator.authenticate(cookies.as_deref()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(err) => errors::auth_error_to_response(err),
    }
}

/// All `Cookie` headers joined into one (HTTP/2 may split them).
fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// Baseline hardening headers on every response.
pub async fn security_headers(req: axum::http::Request<axum::body::Body>, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_cookie_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=tok"));
        assert_eq!(cookie_header(&headers).as_deref(), Some("a=1; session=tok"));
    }

    #[test]
    fn no_cookie_header_is_none() {
        assert_eq!(cookie_header(&HeaderMap::new()), None);
    }
}
