#![warn(missing_docs)]
//! `richtext-core-schema` - data-driven tag tables for `richtext-core`.
//!
//! This crate intentionally stays lightweight and does **not** know anything about the node
//! tree. It answers two questions the engine asks about a tag name:
//!
//! - does the tag flow inside a line of text (*inline*)?
//! - can the tag never hold children (*leaf*)?
//!
//! Tag names are compared case-insensitively and stored lowercase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inline tags of the default HTML schema.
pub const HTML_INLINE_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em",
    "font", "hr", "i", "iframe", "img", "input", "ins", "kbd", "q", "rp", "rt", "ruby", "s",
    "samp", "small", "span", "strike", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

/// Leaf (void) tags of the default HTML schema.
pub const HTML_LEAF_TAGS: &[&str] = &["br", "hr", "iframe", "img", "input"];

/// Tag tables used to classify element nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSchema {
    /// Tags that flow inside a line of text.
    pub inline_tags: BTreeSet<String>,
    /// Tags that never receive children and are never split.
    pub leaf_tags: BTreeSet<String>,
}

impl Default for TagSchema {
    fn default() -> Self {
        Self::html()
    }
}

impl TagSchema {
    /// The HTML schema used by default.
    pub fn html() -> Self {
        Self::new(HTML_INLINE_TAGS.iter().copied(), HTML_LEAF_TAGS.iter().copied())
    }

    /// Build a schema from explicit tag lists.
    ///
    /// Leaf tags are always treated as inline as well.
    pub fn new<I, L>(inline: I, leaf: L) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        let leaf_tags: BTreeSet<String> = leaf
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        let mut inline_tags: BTreeSet<String> = inline
            .into_iter()
            .map(|t| t.as_ref().to_ascii_lowercase())
            .collect();
        inline_tags.extend(leaf_tags.iter().cloned());
        Self {
            inline_tags,
            leaf_tags,
        }
    }

    /// Returns `true` if `tag` flows inside a line of text.
    pub fn is_inline_tag(&self, tag: &str) -> bool {
        contains_ignore_case(&self.inline_tags, tag)
    }

    /// Returns `true` if `tag` can never hold children.
    pub fn is_leaf_tag(&self, tag: &str) -> bool {
        contains_ignore_case(&self.leaf_tags, tag)
    }

    /// Add an inline tag.
    pub fn with_inline_tag(mut self, tag: impl AsRef<str>) -> Self {
        self.inline_tags.insert(tag.as_ref().to_ascii_lowercase());
        self
    }

    /// Add a leaf tag (also registered as inline).
    pub fn with_leaf_tag(mut self, tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().to_ascii_lowercase();
        self.inline_tags.insert(tag.clone());
        self.leaf_tags.insert(tag);
        self
    }
}

fn contains_ignore_case(set: &BTreeSet<String>, tag: &str) -> bool {
    if tag.bytes().any(|b| b.is_ascii_uppercase()) {
        set.contains(&tag.to_ascii_lowercase())
    } else {
        set.contains(tag)
    }
}
