//! Per-page-view session state.
//!
//! One explicit object instead of ambient globals: the discovered item
//! class, which indices already carry a finalized badge, whether a
//! harvest/submit cycle is in flight, and the generation counter that lets
//! a late classification response be recognized as stale.

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct PageSession {
    item_class: Option<String>,
    processed: BTreeSet<u32>,
    in_flight: bool,
    generation: u64,
}

impl PageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn item_class(&self) -> Option<&str> {
        self.item_class.as_deref()
    }

    pub fn set_item_class(&mut self, class: Option<String>) {
        self.item_class = class;
    }

    /// Whether a response harvested under `generation` may still be applied.
    pub fn accepts(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Try to start a harvest/submit cycle. Returns false when one is
    /// already in flight.
    pub fn begin_submission(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_submission(&mut self) {
        self.in_flight = false;
    }

    pub fn mark_processed(&mut self, index: u32) {
        self.processed.insert(index);
    }

    pub fn is_processed(&self, index: u32) -> bool {
        self.processed.contains(&index)
    }

    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }

    /// Reset for a fresh page of reviews. The item class is rediscovered,
    /// processed flags are cleared, and the generation moves on so any
    /// response still in flight for the old page is dropped on arrival.
    pub fn reset_for_pagination(&mut self) {
        self.item_class = None;
        self.processed.clear();
        self.generation += 1;
    }
}
