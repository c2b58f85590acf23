use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One structured sub-rating inside a review, e.g. "Quality: Good".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubReview {
    pub category: String,
    pub content: String,
}

/// The three mutually exclusive shapes of the purchase-metadata line.
///
/// The line is classified purely by child count and `|` presence; exactly
/// one shape is ever produced, which is what keeps the
/// `item_variation`/`location` exclusivity on [`ReviewRecord`] honest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseMeta {
    DateOnly { date: String },
    Variation { date: String, variation: String },
    Location { location: String, date: String },
}

impl PurchaseMeta {
    pub fn date(&self) -> &str {
        match self {
            PurchaseMeta::DateOnly { date }
            | PurchaseMeta::Variation { date, .. }
            | PurchaseMeta::Location { date, .. } => date,
        }
    }

    pub fn variation(&self) -> Option<&str> {
        match self {
            PurchaseMeta::Variation { variation, .. } => Some(variation),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            PurchaseMeta::Location { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// One scraped review, in the classifier's wire shape.
///
/// `item_variation` and `location` are empty strings when absent; at most
/// one of them is non-empty (set via [`ReviewRecord::set_purchase_meta`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub username: String,
    pub ratings: u8,
    pub purchase_date: String,
    pub item_variation: String,
    pub location: String,
    #[serde(with = "subreview_map")]
    pub subreview: Vec<SubReview>,
    pub review_content: String,
    pub has_image: bool,
}

impl ReviewRecord {
    /// Flatten a classified purchase-metadata shape into the record fields.
    pub fn set_purchase_meta(&mut self, meta: PurchaseMeta) {
        self.purchase_date = meta.date().to_string();
        self.item_variation = meta.variation().unwrap_or_default().to_string();
        self.location = meta.location().unwrap_or_default().to_string();
    }
}

/// Sub-reviews travel as a `"sub 0"`-keyed object on the wire but stay an
/// ordered Vec in memory (string-keyed maps sort "sub 10" before "sub 2").
mod subreview_map {
    use super::SubReview;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(subs: &[SubReview], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(subs.len()))?;
        for (i, sub) in subs.iter().enumerate() {
            map.serialize_entry(&format!("sub {}", i), sub)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<SubReview>, D::Error> {
        let raw: BTreeMap<String, SubReview> = BTreeMap::deserialize(d)?;
        let mut entries: Vec<(usize, SubReview)> = raw
            .into_iter()
            .map(|(k, v)| {
                let idx = k
                    .strip_prefix("sub ")
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(usize::MAX);
                (idx, v)
            })
            .collect();
        entries.sort_by_key(|(i, _)| *i);
        Ok(entries.into_iter().map(|(_, v)| v).collect())
    }
}

/// One harvest: an ordered mapping of 1-based review index to record,
/// tagged with the page-state generation it was harvested from.
///
/// The generation never travels on the wire; it exists so a classification
/// response that arrives after the page has paginated away can be detected
/// and dropped instead of overwriting newer badges.
#[derive(Debug, Clone, Default)]
pub struct ReviewBatch {
    reviews: BTreeMap<u32, ReviewRecord>,
    generation: u64,
}

impl ReviewBatch {
    pub fn new(generation: u64) -> Self {
        Self {
            reviews: BTreeMap::new(),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn insert(&mut self, index: u32, record: ReviewRecord) {
        self.reviews.insert(index, record);
    }

    pub fn get(&self, index: u32) -> Option<&ReviewRecord> {
        self.reviews.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.reviews.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Review indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.reviews.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ReviewRecord)> {
        self.reviews.iter().map(|(i, r)| (*i, r))
    }

    /// Append another harvest, re-keying its indices to continue after this
    /// batch's highest index. Used by the multi-page crawl to build one
    /// running batch.
    pub fn merge(&mut self, other: ReviewBatch) {
        let offset = self.reviews.keys().max().copied().unwrap_or(0);
        for (i, r) in other.reviews {
            self.reviews.insert(offset + i, r);
        }
    }
}

impl Serialize for ReviewBatch {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.reviews.len()))?;
        for (i, r) in &self.reviews {
            map.serialize_entry(&format!("review {}", i), r)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ReviewRecord {
        ReviewRecord {
            username: "john_doe".into(),
            ratings: 4,
            purchase_date: "12 Jan 2024".into(),
            item_variation: "Color: Red, Size: M".into(),
            location: String::new(),
            subreview: vec![SubReview {
                category: "Quality".into(),
                content: "Very good".into(),
            }],
            review_content: "Excellent product overall.".into(),
            has_image: true,
        }
    }

    #[test]
    fn test_set_purchase_meta_variation() {
        let mut record = ReviewRecord::default();
        record.set_purchase_meta(PurchaseMeta::Variation {
            date: "12 Jan 2024".into(),
            variation: "Color: Red".into(),
        });
        assert_eq!(record.purchase_date, "12 Jan 2024");
        assert_eq!(record.item_variation, "Color: Red");
        assert!(record.location.is_empty());
    }

    #[test]
    fn test_set_purchase_meta_location_clears_variation() {
        let mut record = ReviewRecord::default();
        record.item_variation = "stale".into();
        record.set_purchase_meta(PurchaseMeta::Location {
            location: "Kuala Lumpur".into(),
            date: "10 Jan 2024".into(),
        });
        assert!(record.item_variation.is_empty());
        assert_eq!(record.location, "Kuala Lumpur");
        assert_eq!(record.purchase_date, "10 Jan 2024");
    }

    #[test]
    fn test_subreview_wire_keys() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["subreview"]["sub 0"]["category"], "Quality");
        assert_eq!(json["subreview"]["sub 0"]["content"], "Very good");
    }

    #[test]
    fn test_subreview_roundtrip_preserves_order_past_ten() {
        let mut record = ReviewRecord::default();
        for i in 0..12 {
            record.subreview.push(SubReview {
                category: format!("cat{}", i),
                content: "x".into(),
            });
        }
        let json = serde_json::to_string(&record).unwrap();
        let back: ReviewRecord = serde_json::from_str(&json).unwrap();
        let cats: Vec<&str> = back.subreview.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(cats[10], "cat10");
        assert_eq!(cats[11], "cat11");
    }

    #[test]
    fn test_batch_wire_keys() {
        let mut batch = ReviewBatch::new(0);
        batch.insert(1, sample_record());
        batch.insert(3, ReviewRecord::default());
        let json = serde_json::to_value(&batch).unwrap();
        assert!(json.get("review 1").is_some());
        assert!(json.get("review 2").is_none());
        assert!(json.get("review 3").is_some());
        assert_eq!(json["review 1"]["username"], "john_doe");
    }

    #[test]
    fn test_batch_merge_continues_indices() {
        let mut first = ReviewBatch::new(0);
        first.insert(1, sample_record());
        first.insert(2, ReviewRecord::default());

        let mut second = ReviewBatch::new(0);
        second.insert(1, sample_record());
        second.insert(3, ReviewRecord::default());

        first.merge(second);
        let indices: Vec<u32> = first.indices().collect();
        assert_eq!(indices, vec![1, 2, 3, 5]);
    }

    #[test]
    fn test_batch_generation_tag() {
        let batch = ReviewBatch::new(7);
        assert_eq!(batch.generation(), 7);
    }
}
