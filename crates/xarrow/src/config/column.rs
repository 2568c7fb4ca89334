//! Column configuration structures.

use serde::{Deserialize, Serialize};

use crate::error::{XArrowError, XArrowResult};

/// Configuration for a `PrimitiveColumn`.
///
/// # Example
///
/// ```rust
/// use xarrow::config::ColumnConfig;
///
/// let config = ColumnConfig::default();
/// assert_eq!(config.initial_capacity, 0);
/// assert!(!config.shrink_on_export);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Number of elements reserved when the column is created.
    /// Default: 0 (no allocation until the first push)
    pub initial_capacity: usize,

    /// Shrink the backing storage to the logical length before an owned
    /// export, so the consumer receives a tight allocation.
    /// Default: false
    pub shrink_on_export: bool,

    /// Upper bound on `initial_capacity`, in elements.
    /// Default: `u32::MAX`
    pub max_initial_capacity: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            shrink_on_export: false,
            max_initial_capacity: u32::MAX as usize,
        }
    }
}

impl ColumnConfig {
    /// Creates a configuration that reserves `capacity` elements up front.
    #[must_use]
    pub fn with_initial_capacity(capacity: usize) -> Self {
        Self {
            initial_capacity: capacity,
            ..Default::default()
        }
    }

    /// Creates a small configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            initial_capacity: 16,
            shrink_on_export: true,
            max_initial_capacity: 1 << 20,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> XArrowResult<()> {
        if self.initial_capacity > self.max_initial_capacity {
            return Err(XArrowError::InvalidConfig {
                message: format!(
                    "initial_capacity {} exceeds max_initial_capacity {}",
                    self.initial_capacity, self.max_initial_capacity
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ColumnConfig::default();
        assert_eq!(config.initial_capacity, 0);
        assert!(!config.shrink_on_export);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = ColumnConfig {
            initial_capacity: 100,
            max_initial_capacity: 10,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, XArrowError::InvalidConfig { .. }));
    }

    #[test]
    fn test_testing_config() {
        let config = ColumnConfig::for_testing();
        assert!(config.validate().is_ok());
        assert!(config.shrink_on_export);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ColumnConfig =
            serde_json::from_str(r#"{ "shrink_on_export": true }"#).unwrap();
        assert!(config.shrink_on_export);
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.max_initial_capacity, u32::MAX as usize);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = ColumnConfig::with_initial_capacity(256);
        let json = serde_json::to_string(&config).unwrap();
        let back: ColumnConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
