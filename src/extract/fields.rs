//! Field extraction for a single review item.
//!
//! The item's shape is positional: the second element child holds the
//! purchaser-info collection, whose slots are username (0), star row (1)
//! and the purchase-metadata line (2). The content and image blocks are
//! found among the item's children by class marker.

use scraper::ElementRef;

use crate::domain::{PurchaseMeta, ReviewRecord, SubReview};
use crate::extract::{collapsed_text, element_children, has_marker, ExtractError, Markers};

/// Accessor over one review-item node, naming the positional slots the
/// markup never labels. Every access returns a typed failure instead of
/// indexing out of range.
pub struct ReviewItem<'a> {
    root: ElementRef<'a>,
}

impl<'a> ReviewItem<'a> {
    pub fn new(root: ElementRef<'a>) -> Self {
        Self { root }
    }

    /// The purchaser-info slot collection: children of the item's second
    /// element child.
    fn purchaser_info(&self) -> Result<Vec<ElementRef<'a>>, ExtractError> {
        let info = element_children(&self.root)
            .into_iter()
            .nth(1)
            .ok_or(ExtractError::MissingPurchaserInfo)?;
        let slots = element_children(&info);
        if slots.is_empty() {
            return Err(ExtractError::MissingPurchaserInfo);
        }
        Ok(slots)
    }

    fn username(&self, slots: &[ElementRef<'a>]) -> Result<String, ExtractError> {
        let slot = slots.first().ok_or(ExtractError::MissingSlot("username"))?;
        Ok(collapsed_text(slot))
    }

    fn ratings(&self, slots: &[ElementRef<'a>], filled_star: &str) -> Result<u8, ExtractError> {
        let row = slots.get(1).ok_or(ExtractError::MissingSlot("ratings"))?;
        let filled = element_children(row)
            .iter()
            .filter(|star| has_marker(star, filled_star))
            .count();
        Ok(filled.min(5) as u8)
    }

    fn purchase_meta(&self, slots: &[ElementRef<'a>]) -> Result<PurchaseMeta, ExtractError> {
        let line = slots
            .get(2)
            .ok_or(ExtractError::MissingSlot("purchase metadata"))?;
        Ok(classify_purchase_meta(line))
    }

    fn content_block(&self, marker: &str) -> Option<ElementRef<'a>> {
        element_children(&self.root)
            .into_iter()
            .find(|child| has_marker(child, marker))
    }

    fn has_image(&self, marker: &str) -> bool {
        element_children(&self.root)
            .iter()
            .any(|child| has_marker(child, marker))
    }
}

/// Extract one [`ReviewRecord`] from a review-item node.
pub fn extract_review(
    root: ElementRef<'_>,
    markers: &Markers,
) -> Result<ReviewRecord, ExtractError> {
    let item = ReviewItem::new(root);
    let slots = item.purchaser_info()?;

    let mut record = ReviewRecord {
        username: item.username(&slots)?,
        ratings: item.ratings(&slots, &markers.filled_star)?,
        ..ReviewRecord::default()
    };
    record.set_purchase_meta(item.purchase_meta(&slots)?);

    if let Some(block) = item.content_block(&markers.content_block) {
        let (content, subreview) = parse_content_block(&block);
        record.review_content = content;
        record.subreview = subreview;
    }
    record.has_image = item.has_image(&markers.image_block);

    Ok(record)
}

/// Classify the purchase-metadata line into exactly one of its three shapes.
///
/// More than one child node means the line carries location and date as
/// separate nodes; a single node containing `|` is the date|variation form;
/// anything else is a bare date. Purely positional and delimiter-based, so
/// a markup change shifts records between shapes rather than erroring.
fn classify_purchase_meta(line: &ElementRef<'_>) -> PurchaseMeta {
    let kids = element_children(line);
    if kids.len() > 1 {
        let (location, date) = split_pipe(&collapsed_text(&kids[0]));
        return PurchaseMeta::Location { location, date };
    }

    let text = collapsed_text(line);
    if text.contains('|') {
        let (date, variation) = split_pipe(&text);
        PurchaseMeta::Variation { date, variation }
    } else {
        PurchaseMeta::DateOnly { date: text }
    }
}

fn split_pipe(text: &str) -> (String, String) {
    match text.split_once('|') {
        Some((left, right)) => (left.trim().to_string(), right.trim().to_string()),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Pull the free-text body and any structured sub-ratings out of the
/// content block. A child element whose own children all read as
/// `category: content` pairs is the sub-rating list; everything else
/// contributes to the body text.
fn parse_content_block(block: &ElementRef<'_>) -> (String, Vec<SubReview>) {
    let mut subreview = Vec::new();
    let mut parts: Vec<String> = Vec::new();

    for child in block.children() {
        if let Some(el) = ElementRef::wrap(child) {
            let entries = element_children(&el);
            let looks_like_sub_list = !entries.is_empty()
                && entries
                    .iter()
                    .all(|entry| collapsed_text(entry).contains(':'));
            if subreview.is_empty() && looks_like_sub_list {
                for entry in entries {
                    let text = collapsed_text(&entry);
                    let (category, content) = match text.split_once(':') {
                        Some((c, v)) => (c.trim().to_string(), v.trim().to_string()),
                        None => (text, String::new()),
                    };
                    subreview.push(SubReview { category, content });
                }
                continue;
            }
            parts.push(collapsed_text(&el));
        } else if let Some(text) = child.value().as_text() {
            parts.push(text.to_string());
        }
    }

    let content = parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (content, subreview)
}
