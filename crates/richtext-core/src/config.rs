//! Editor configuration.
//!
//! Every field has a default, so hosts can deserialize a partial JSON object:
//!
//! ```rust
//! use richtext_core::EditorConfig;
//!
//! let config: EditorConfig = serde_json::from_str(r#"{ "block_tag": "p" }"#).unwrap();
//! assert_eq!(config.block_tag, "p");
//! assert_eq!(config.undo.undo_limit, None);
//! ```

use crate::node::Attributes;
use richtext_core_schema::TagSchema;
use serde::{Deserialize, Serialize};

/// Filler inserted into an empty inline element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineFiller {
    /// An empty text node.
    #[default]
    EmptyText,
    /// A text node holding a single zero-width space, for hosts that cannot place a caret
    /// inside empty text.
    ZeroWidthSpace,
}

/// Filler inserted into an empty block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockFiller {
    /// A `<br>` appended to the deepest trailing block.
    #[default]
    LineBreak,
    /// An empty text node at the first leaf position.
    EmptyText,
}

/// Focusability fillers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// Filler for inline elements.
    pub inline: InlineFiller,
    /// Filler for blocks.
    pub block: BlockFiller,
}

/// Undo history bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// Snapshot size in UTF-8 bytes above which the history is trimmed.
    pub document_size_threshold: Option<usize>,
    /// Number of entries kept once the threshold is exceeded.
    pub undo_limit: Option<usize>,
}

/// Configuration of an editor instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tag of the default block.
    pub block_tag: String,
    /// Attributes of the default block, in order.
    pub block_attributes: Vec<(String, String)>,
    /// Focusability fillers.
    pub filler: FillerConfig,
    /// Undo history bounds.
    pub undo: UndoConfig,
    /// Inline and leaf tag tables.
    pub schema: TagSchema,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            block_tag: "div".to_string(),
            block_attributes: Vec::new(),
            filler: FillerConfig::default(),
            undo: UndoConfig::default(),
            schema: TagSchema::html(),
        }
    }
}

impl EditorConfig {
    /// Attributes of the default block as an [`Attributes`] map.
    pub fn block_attributes(&self) -> Attributes {
        self.block_attributes.iter().cloned().collect()
    }
}
