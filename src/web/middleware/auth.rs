//! Session authentication extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;

use crate::db::User;
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for authenticated users.
///
/// The token is looked up, in order, in the `Authorization: Bearer` header,
/// the session cookie and the `token` query parameter (for links such as
/// downloads that cannot carry headers). The user row is re-read so quota
/// counters are current.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers, &state.cookie.name))
            .or_else(|| query_token(parts.uri.query()))
            .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

        let user = state.auth_service().current_user(&token).await?;

        Ok(AuthUser(user))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn cookie_token(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

fn query_token(query: Option<&str>) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" && !value.is_empty() {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; eucloud_session=tok123"),
        );
        assert_eq!(
            cookie_token(&headers, "eucloud_session").as_deref(),
            Some("tok123")
        );
        assert_eq!(cookie_token(&headers, "other"), None);
    }

    #[test]
    fn test_query_token() {
        assert_eq!(query_token(None), None);
        assert_eq!(query_token(Some("folder_id=3")), None);
        assert_eq!(
            query_token(Some("a=1&token=abc%2Edef")).as_deref(),
            Some("abc.def")
        );
        assert_eq!(query_token(Some("token=")), None);
    }
}
