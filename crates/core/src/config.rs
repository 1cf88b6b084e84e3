//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_NOTIFICATION_CAPACITY, STORE_DIR_NAME};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    notification_capacity: usize,
    directory_file: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `notification_capacity` is zero.
    pub fn new(
        data_dir: PathBuf,
        notification_capacity: usize,
        directory_file: Option<PathBuf>,
    ) -> CoreResult<Self> {
        if notification_capacity == 0 {
            return Err(CoreError::InvalidInput(
                "notification capacity must be at least 1".into(),
            ));
        }

        Ok(Self {
            data_dir,
            notification_capacity,
            directory_file,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory used by the file-backed key-value store.
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR_NAME)
    }

    pub fn notification_capacity(&self) -> usize {
        self.notification_capacity
    }

    pub fn directory_file(&self) -> Option<&Path> {
        self.directory_file.as_deref()
    }
}

/// Parse the notification capacity from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_NOTIFICATION_CAPACITY`].
pub fn notification_capacity_from_env_value(value: Option<String>) -> CoreResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_NOTIFICATION_CAPACITY),
        Some(v) => v.parse::<usize>().map_err(|_| {
            CoreError::InvalidInput(format!(
                "RESQ_NOTIFICATION_CAPACITY must be a positive integer, got '{v}'"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_capacity() {
        let result = CoreConfig::new(PathBuf::from("/tmp/resq"), 0, None);
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    }

    #[test]
    fn test_store_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/resq"), 20, None).unwrap();
        assert_eq!(cfg.store_dir(), PathBuf::from("/srv/resq/store"));
        assert!(cfg.directory_file().is_none());
    }

    #[test]
    fn test_capacity_defaults_when_unset_or_blank() {
        assert_eq!(notification_capacity_from_env_value(None).unwrap(), 20);
        assert_eq!(
            notification_capacity_from_env_value(Some("   ".into())).unwrap(),
            20
        );
    }

    #[test]
    fn test_capacity_parses_value() {
        assert_eq!(
            notification_capacity_from_env_value(Some(" 50 ".into())).unwrap(),
            50
        );
        assert!(notification_capacity_from_env_value(Some("many".into())).is_err());
    }
}
