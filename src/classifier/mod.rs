//! Classification service client.
//!
//! The classifier is an external collaborator: it receives the harvested
//! batch keyed `review 1..N` and returns a parallel `predictions` mapping.
//! The trait is the seam; tests substitute it freely.

pub mod http;

pub use http::HttpClassifier;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{ClassificationResult, ReviewBatch};

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Submit a harvested batch, returning verdicts keyed by review index.
    ///
    /// Response keys that don't correlate to a review index are dropped by
    /// the implementation, never surfaced as verdicts.
    async fn classify(&self, batch: &ReviewBatch) -> Result<BTreeMap<u32, ClassificationResult>>;

    /// Cheap reachability probe of the service.
    async fn health(&self) -> Result<()>;
}
