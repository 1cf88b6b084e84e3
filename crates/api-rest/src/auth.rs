use crate::error::ApiError;
use crate::state::AppState;
use api_shared::{API_KEY_HEADER, API_KEY_QUERY_PARAM};
use axum::{
    extract::{Query, Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;

/// Rejects requests without the configured API key. A no-op when no key is configured.
///
/// The key is read from the `x-api-key` header, or from the `api_key` query parameter.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(key) = state.api_key() {
        let provided = match request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some(header) => Some(header.to_owned()),
            None => query_param(request.uri(), API_KEY_QUERY_PARAM),
        };

        if let Err(e) = key.validate(provided.as_deref()) {
            tracing::warn!(path = %request.uri().path(), "rejected request: {}", e);
            return Err(e.into());
        }
    }
    Ok(next.run(request).await)
}

/// Percent-decoded value of the query parameter `name`, if present.
fn query_param(uri: &Uri, name: &str) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(uri: &str) -> Option<String> {
        query_param(&uri.parse::<Uri>().unwrap(), "api_key")
    }

    #[test]
    fn test_query_param() {
        assert_eq!(param("/ws?api_key=abc&x=1").as_deref(), Some("abc"));
        assert_eq!(param("/ws?x=1&api_key=abc").as_deref(), Some("abc"));
        assert_eq!(param("/ws?api_keys=abc"), None);
        assert_eq!(param("/ws"), None);
    }

    #[test]
    fn test_query_param_is_percent_decoded() {
        assert_eq!(param("/ws?api_key=s3cr%2Bt").as_deref(), Some("s3cr+t"));
        assert_eq!(param("/ws?api_key=a%26b%3Dc%25d").as_deref(), Some("a&b=c%d"));
        assert_eq!(param("/ws?api_key=two+words").as_deref(), Some("two words"));
    }
}
