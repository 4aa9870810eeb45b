//! Document outline (bookmarks) support.
//!
//! Provides the hierarchical bookmark structure that hosts hand to the
//! analyzer as corroborating evidence for heading levels. The tree itself
//! comes from the surrounding application (e.g. a PDF or EPUB backend);
//! this module only defines its shape and the flattened traversal the
//! heading analyzer consumes.

use serde::{Deserialize, Serialize};

/// A single outline item (bookmark) in the document hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    /// The title of this bookmark
    pub title: String,

    /// Child bookmarks under this item
    #[serde(default)]
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Create a leaf outline item with no children.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            children: Vec::new(),
        }
    }

    /// Create an outline item with children.
    pub fn with_children(title: impl Into<String>, children: Vec<OutlineItem>) -> Self {
        Self {
            title: title.into(),
            children,
        }
    }
}

/// A flattened outline entry: title plus its 1-based depth in the tree.
#[derive(Debug, Clone)]
pub struct FlatOutlineEntry {
    /// The bookmark title
    pub title: String,
    /// Depth in the outline tree (root items are depth 1)
    pub depth: u8,
}

/// Flatten an outline tree into depth-annotated entries, in document order.
///
/// Depth is capped at 6 to match the heading-level range.
///
/// # Examples
///
/// ```
/// use docstrata::outline::{flatten_outline, OutlineItem};
///
/// let outline = vec![OutlineItem::with_children(
///     "Introduction",
///     vec![OutlineItem::new("Background")],
/// )];
///
/// let flat = flatten_outline(&outline);
/// assert_eq!(flat.len(), 2);
/// assert_eq!(flat[0].depth, 1);
/// assert_eq!(flat[1].depth, 2);
/// ```
pub fn flatten_outline(items: &[OutlineItem]) -> Vec<FlatOutlineEntry> {
    let mut entries = Vec::new();
    flatten_into(items, 1, &mut entries);
    entries
}

fn flatten_into(items: &[OutlineItem], depth: u8, out: &mut Vec<FlatOutlineEntry>) {
    for item in items {
        out.push(FlatOutlineEntry {
            title: item.title.clone(),
            depth: depth.min(6),
        });
        if !item.children.is_empty() {
            flatten_into(&item.children, depth.saturating_add(1), out);
        }
    }
}
