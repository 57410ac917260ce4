//! Middleware for authentication and other cross-cutting concerns

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use huddle_database::UserId;
use tower_http::cors::{Any, CorsLayer};

use crate::error::GatewayError;
use crate::state::GatewayState;

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub UserId);

impl CallerIdentity {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }
}

/// Resolve the bearer token on the request into a [`CallerIdentity`].
pub async fn auth_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let token = extract_token(request.headers(), request.uri()).ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing authentication token".to_string())
    })?;

    let session = state.authenticator().authenticate_token(&token).await?;

    request
        .extensions_mut()
        .insert(CallerIdentity(session.user_id));

    Ok(next.run(request).await)
}

/// Bearer token from the `Authorization` header, or the `token` query
/// parameter for clients that cannot set headers (WebSocket upgrades).
pub fn extract_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    auth_header.or_else(|| query_token(uri.query()?))
}

fn query_token(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let mut parts = pair.splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some("token"), Some(value)) if !value.is_empty() => {
                urlencoding::decode(value).ok().map(|decoded| decoded.into_owned())
            }
            _ => None,
        }
    })
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    Ok(response)
}

/// CORS for browser clients. Tokens travel in headers, so no credentials.
pub fn create_cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        let uri: Uri = "/api/conversations".parse().unwrap();

        assert_eq!(extract_token(&headers, &uri).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_token_from_query_is_decoded() {
        let headers = HeaderMap::new();
        let uri: Uri = "/ws?foo=bar&token=a%2Db_c".parse().unwrap();

        assert_eq!(extract_token(&headers, &uri).as_deref(), Some("a-b_c"));
    }

    #[test]
    fn test_missing_or_malformed_token() {
        let mut headers = HeaderMap::new();
        let uri: Uri = "/ws?token=".parse().unwrap();
        assert_eq!(extract_token(&headers, &uri), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        let uri: Uri = "/api/users".parse().unwrap();
        assert_eq!(extract_token(&headers, &uri), None);
    }
}
