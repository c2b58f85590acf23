use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::app::Result;
use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use crate::domain::{ClassificationResult, PredictionsResponse, ReviewBatch};

const SUBMIT_PATH: &str = "/_api/submit-reviews";
const HEALTH_PATH: &str = "/_api/health";

pub struct HttpClassifier {
    client: Client,
    base: Url,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("frauditor/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, batch: &ReviewBatch) -> Result<BTreeMap<u32, ClassificationResult>> {
        let url = self.endpoint(SUBMIT_PATH)?;
        let response = self.client.post(url).json(batch).send().await?;
        response.error_for_status_ref()?;

        let envelope: PredictionsResponse = response.json().await?;
        let (indexed, rejected) = envelope.into_indexed();
        for key in rejected {
            warn!("Dropping prediction with unparseable key {:?}", key);
        }
        Ok(indexed)
    }

    async fn health(&self) -> Result<()> {
        let url = self.endpoint(HEALTH_PATH)?;
        let response = self.client.get(url).send().await?;
        response.error_for_status_ref()?;
        Ok(())
    }
}
