//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration carried by a [`TypeRegistry`](crate::TypeRegistry).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Textual rendering
    pub format: FormatConfig,
    /// Persistence shapes
    pub codec: CodecConfig,
}

/// Layout policy for rendered instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Lines longer than this break into one field per line
    pub max_width: usize,
    /// Spaces per nesting level when broken
    pub indent: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            max_width: 80,
            indent: 4,
        }
    }
}

/// Shape of encoded instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Key that carries the variant name of union instances
    pub variant_key: String,
    /// Decode JSON `null` in a field as an absent value
    pub null_as_absent: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            variant_key: "@tag".to_string(),
            null_as_absent: true,
        }
    }
}
