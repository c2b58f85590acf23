pub mod classification;
pub mod review;

pub use classification::{Analysis, ClassificationResult, Prediction, PredictionsResponse};
pub use review::{PurchaseMeta, ReviewBatch, ReviewRecord, SubReview};
