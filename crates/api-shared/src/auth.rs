use std::fmt;

/// Header carrying the API key on HTTP requests.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter accepted instead of the header (browsers cannot set headers on WebSocket
/// upgrades).
pub const API_KEY_QUERY_PARAM: &str = "api_key";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing API key")]
    Missing,
    #[error("Invalid API key")]
    Invalid,
}

/// The key clients must present. Resolved once at startup.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    /// Returns `None` when the value is unset or blank, which leaves the API open.
    pub fn from_env_value(value: Option<String>) -> Option<Self> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self)
    }

    /// Validates the provided API key.
    pub fn validate(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let provided = provided.ok_or(AuthError::Missing)?;
        if constant_time_eq(provided.as_bytes(), self.0.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::Invalid)
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_key_disables_auth() {
        assert!(ApiKey::from_env_value(None).is_none());
        assert!(ApiKey::from_env_value(Some("  ".into())).is_none());
    }

    #[test]
    fn test_validate() {
        let key = ApiKey::from_env_value(Some("s3cret".into())).unwrap();
        assert_eq!(key.validate(Some("s3cret")), Ok(()));
        assert_eq!(key.validate(Some("s3cre")), Err(AuthError::Invalid));
        assert_eq!(key.validate(Some("S3cret")), Err(AuthError::Invalid));
        assert_eq!(key.validate(None), Err(AuthError::Missing));
        assert_eq!(format!("{key:?}"), "ApiKey(<redacted>)");
    }
}
