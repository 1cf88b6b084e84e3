//! Internal implementation of the identifier types.

use crate::{IdError, IdResult};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

const NOTIFICATION_PREFIX: &str = "notification_";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A notification identifier of the form `notification_<unix-millis>_<suffix>`.
///
/// # Construction
/// - [`NotificationId::generate`] allocates a fresh identifier for "now".
/// - [`NotificationId::parse`] validates an externally supplied identifier.
///
/// Parsing is strict about the shape but accepts any suffix length from 1 to 9 characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NotificationId {
    millis: i64,
    suffix: String,
}

impl NotificationId {
    /// Generates a new identifier stamped with the current time.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generates a new identifier stamped with `at`.
    pub fn generate_at(at: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        Self {
            millis: at.timestamp_millis(),
            suffix,
        }
    }

    /// Validates and parses a notification identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` does not match
    /// `notification_<digits>_<1-9 lowercase base36>`.
    pub fn parse(input: &str) -> IdResult<Self> {
        let invalid = || {
            IdError::InvalidInput(format!(
                "notification id must look like 'notification_<millis>_<suffix>', got: '{}'",
                input
            ))
        };

        let rest = input.strip_prefix(NOTIFICATION_PREFIX).ok_or_else(invalid)?;
        let (millis_str, suffix) = rest.split_once('_').ok_or_else(invalid)?;

        if millis_str.is_empty() || !millis_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let millis: i64 = millis_str.parse().map_err(|_| invalid())?;

        if suffix.is_empty()
            || suffix.len() > SUFFIX_LEN
            || !suffix
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z'))
        {
            return Err(invalid());
        }

        Ok(Self {
            millis,
            suffix: suffix.to_owned(),
        })
    }

    /// Returns the creation instant encoded in the identifier, if it is representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", NOTIFICATION_PREFIX, self.millis, self.suffix)
    }
}

impl FromStr for NotificationId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationId::parse(s)
    }
}

/// An admission request identifier of the form `REQ<12 uppercase hex>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl Default for RequestId {
    fn default() -> Self {
        Self::generate()
    }
}

impl RequestId {
    /// Allocates a new request identifier from a v4 UUID.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
        Self(format!("REQ{}", &hex[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for NotificationId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for NotificationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotificationId::parse(&s).map_err(serde::de::Error::custom)
    }
}
