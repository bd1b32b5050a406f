//! Resource limits and the namespace/parameter sentinel key.
//!
//! Every bound the parser enforces lives in [`ParserLimits`]. Defaults can be
//! adjusted programmatically with the `with_*` builders or through the
//! `ROSZ_PARAMS_LIMITS` environment variable:
//!
//! ```text
//! export ROSZ_PARAMS_LIMITS='max_parameters=2048;max_string_size=1024'
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Limit, ParamError, Result};

/// Longest key or scalar token accepted, in bytes.
pub const DEFAULT_MAX_STRING_SIZE: usize = 256;
/// Most parameters a store may hold across all of its nodes.
pub const DEFAULT_MAX_PARAMETERS: usize = 512;
/// Most elements accepted in a single sequence value.
pub const DEFAULT_MAX_ARRAY_ELEMENTS: usize = 1024;
/// Most nodes a store may hold.
pub const DEFAULT_MAX_NODES: usize = 256;
/// Deepest combined namespace and parameter nesting.
pub const DEFAULT_MAX_DEPTH: usize = 128;
/// Mapping key that switches from node namespaces to parameter names.
pub const PARAMS_KEY: &str = "ros__parameters";
/// Environment variable read by [`ParserLimits::from_env`].
pub const LIMITS_ENV_VAR: &str = "ROSZ_PARAMS_LIMITS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserLimits {
    pub max_string_size: usize,
    pub max_parameters: usize,
    pub max_array_elements: usize,
    pub max_nodes: usize,
    pub max_depth: usize,
    pub params_key: String,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_string_size: DEFAULT_MAX_STRING_SIZE,
            max_parameters: DEFAULT_MAX_PARAMETERS,
            max_array_elements: DEFAULT_MAX_ARRAY_ELEMENTS,
            max_nodes: DEFAULT_MAX_NODES,
            max_depth: DEFAULT_MAX_DEPTH,
            params_key: PARAMS_KEY.to_string(),
        }
    }
}

impl ParserLimits {
    pub fn with_max_string_size(mut self, max: usize) -> Self {
        self.max_string_size = max;
        self
    }

    pub fn with_max_parameters(mut self, max: usize) -> Self {
        self.max_parameters = max;
        self
    }

    pub fn with_max_array_elements(mut self, max: usize) -> Self {
        self.max_array_elements = max;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Use a different sentinel key than `ros__parameters`.
    pub fn with_params_key<S: Into<String>>(mut self, key: S) -> Self {
        self.params_key = key.into();
        self
    }

    /// Defaults, adjusted by `ROSZ_PARAMS_LIMITS` when it is set.
    pub fn from_env() -> Result<Self> {
        match std::env::var(LIMITS_ENV_VAR) {
            Ok(overrides) => {
                tracing::debug!("[PARAMS] Applying limits from {}: {}", LIMITS_ENV_VAR, overrides);
                Self::default().apply_overrides(&overrides)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Apply `key=value` pairs separated by `;`.
    pub fn apply_overrides(mut self, overrides: &str) -> Result<Self> {
        for pair in overrides.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let Some((key, value)) = pair.split_once('=') else {
                return Err(ParamError::InvalidLimits(format!(
                    "expected key=value, got '{}'",
                    pair
                )));
            };
            let key = key.trim();
            let value = value.trim();

            if key == "params_key" {
                if value.is_empty() {
                    return Err(ParamError::InvalidLimits(
                        "params_key cannot be empty".to_string(),
                    ));
                }
                self.params_key = value.to_string();
                continue;
            }

            let parsed: usize = value.parse().map_err(|e| {
                ParamError::InvalidLimits(format!("value '{}' for '{}': {}", value, key, e))
            })?;
            match key {
                "max_string_size" => self.max_string_size = parsed,
                "max_parameters" => self.max_parameters = parsed,
                "max_array_elements" => self.max_array_elements = parsed,
                "max_nodes" => self.max_nodes = parsed,
                "max_depth" => self.max_depth = parsed,
                _ => {
                    return Err(ParamError::InvalidLimits(format!("unknown key '{}'", key)));
                }
            }
            tracing::debug!("[PARAMS] Limit override: {} = {}", key, parsed);
        }
        Ok(self)
    }

    pub(crate) fn check_string(&self, text: &str) -> Result<()> {
        if text.len() > self.max_string_size {
            return Err(ParamError::limit(Limit::StringSize, self.max_string_size));
        }
        Ok(())
    }
}
