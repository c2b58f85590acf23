//! Review extraction from rendered HTML.
//!
//! The review list markup is undocumented, minimally labeled and versioned:
//! class names are generated, fields are identified by position, and the
//! purchase-metadata line is classified purely by child count and delimiter
//! presence. Everything here assumes that shape through the
//! [`fields::ReviewItem`] accessor and fails per item, never per page.
//!
//! ```text
//! container snapshot → discover item class → extract each item → ReviewBatch
//! ```

pub mod fields;
pub mod harvest;

pub use fields::extract_review;
pub use harvest::{discover_item_class, harvest_container, harvest_snapshot};

use scraper::ElementRef;
use thiserror::Error;

/// Class markers that identify semantically meaningful blocks inside a
/// review item. Matched as substrings of the `class` attribute, since the
/// page decorates them with generated suffixes.
#[derive(Debug, Clone)]
pub struct Markers {
    pub filled_star: String,
    pub content_block: String,
    pub image_block: String,
}

/// A review item (or snapshot) that doesn't match the expected shape.
///
/// Scoped to one item: the harvester logs it and moves on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("review item is missing its purchaser-info block")]
    MissingPurchaserInfo,

    #[error("purchaser info is missing the {0} slot")]
    MissingSlot(&'static str),

    #[error("snapshot contained no review container")]
    EmptySnapshot,
}

/// Element children of a node, skipping text and comment nodes.
pub(crate) fn element_children<'a>(el: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// Whether the element's class attribute carries the marker as a substring.
pub(crate) fn has_marker(el: &ElementRef<'_>, marker: &str) -> bool {
    el.value()
        .attr("class")
        .is_some_and(|class| class.contains(marker))
}

/// Descendant text with runs of whitespace collapsed to single spaces.
pub(crate) fn collapsed_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
