//! Caller identity resolution.
//!
//! Resolution order: admin token header, then session header, then anonymous
//! keyed by client address. The extractor never rejects; an unidentified
//! caller is simply anonymous.

use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use snapbin_core::models::Identity;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const SESSION_USER_HEADER: &str = "x-session-user";

/// Who is making the request, plus the key the rate limiter buckets them
/// under (owner name when identified, client IP otherwise).
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub identity: Identity,
    pub client_key: String,
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    Arc<AppState>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = Arc::<AppState>::from_ref(state);

        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let identity = match (&app.config.admin_token, header(ADMIN_TOKEN_HEADER)) {
            (Some(expected), Some(provided)) if expected == provided => Identity::Admin,
            _ => match header(SESSION_USER_HEADER) {
                Some(user) => Identity::User(user.to_string()),
                None => Identity::Anonymous,
            },
        };

        let client_key = match identity.owner() {
            Some(owner) => owner.to_string(),
            None => client_address(parts),
        };

        Ok(RequestIdentity {
            identity,
            client_key,
        })
    }
}

/// Client address for rate limit bucketing: first X-Forwarded-For hop when
/// present, otherwise the socket peer address.
fn client_address(parts: &Parts) -> String {
    if let Some(forwarded) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
