use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::Result;
use crate::classifier::http::HttpClassifier;
use crate::classifier::Classifier;
use crate::config::Config;

pub struct AppContext {
    pub config: Config,
    pub classifier: Arc<dyn Classifier>,
}

impl AppContext {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(p) => Config::load_from(&p)?,
            None => Config::load()?,
        };
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let classifier: Arc<dyn Classifier> = Arc::new(HttpClassifier::new(&config.classifier)?);
        Ok(Self { config, classifier })
    }
}
