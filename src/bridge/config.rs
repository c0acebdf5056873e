use serde::Deserialize;

use crate::{bridge::error::BridgeError, finalization::FinalizationMode};

const DEFAULT_HANDLE_LIMIT: u32 = u32::MAX;

/// Bridge settings.
///
/// Defaults:
/// - finalization: `deterministic`
/// - handle limit: `u32::MAX`
/// - over-release warnings: enabled
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    pub finalization: FinalizationMode,
    /// Largest handle number the table may hand out.
    pub handle_limit: u32,
    pub warn_on_over_release: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            finalization: FinalizationMode::default(),
            handle_limit: DEFAULT_HANDLE_LIMIT,
            warn_on_over_release: true,
        }
    }
}

impl BridgeConfig {
    /// Parses a JSON settings object; missing fields keep their defaults.
    pub fn from_json(source: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig =
            serde_json::from_str(source).map_err(|err| BridgeError::Config(err.to_string()))?;
        if config.handle_limit == 0 {
            return Err(BridgeError::Config(
                "handle_limit must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn with_finalization(mut self, mode: FinalizationMode) -> Self {
        self.finalization = mode;
        self
    }

    pub fn with_handle_limit(mut self, limit: u32) -> Self {
        self.handle_limit = limit;
        self
    }
}
