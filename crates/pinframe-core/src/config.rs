//! Layout configuration.

use crate::geometry::Size;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid layout config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings an embedder passes to the layout cascade and the session.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Active breakpoint. `None` resolves with the `base` constraints.
    pub breakpoint: Option<String>,

    /// Re-run the cascade after every committed store write. Default: **true**.
    /// Embedders that batch many writes can turn this off and call
    /// `commit_all` themselves.
    pub auto_commit: bool,

    /// Size given to frames created without an explicit size.
    pub default_frame_size: Size,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            breakpoint: None,
            auto_commit: true,
            default_frame_size: Size::new(100.0, 100.0),
        }
    }
}

impl LayoutConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn breakpoint(&self) -> Option<&str> {
        self.breakpoint.as_deref()
    }

    #[must_use]
    pub fn with_breakpoint(mut self, breakpoint: impl Into<String>) -> Self {
        self.breakpoint = Some(breakpoint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_json_fills_defaults() {
        let config = LayoutConfig::from_json(r#"{"breakpoint":"mobile"}"#).unwrap();
        assert_eq!(config.breakpoint(), Some("mobile"));
        assert!(config.auto_commit);
        assert_eq!(config.default_frame_size, Size::new(100.0, 100.0));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = LayoutConfig::from_json(r#"{"autoCommit":"yes"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid layout config"));
    }
}
