pub mod handlers;
pub mod inference_log;
pub mod routes;

pub use inference_log::{InferenceLogWriter, PredictionEvent};
pub use routes::*;

use crate::config::Config;
use crate::error::Result;
use crate::training::{ArtifactStore, ChurnModel, TrainSchema};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ChurnModel>,
    pub schema: Arc<TrainSchema>,
    pub inference_log: Arc<InferenceLogWriter>,
}

impl AppState {
    pub fn new(model: ChurnModel, schema: TrainSchema, inference_log: InferenceLogWriter) -> Self {
        Self {
            model: Arc::new(model),
            schema: Arc::new(schema),
            inference_log: Arc::new(inference_log),
        }
    }

    /// Load the deployed model and schema and open the inference log
    pub fn load(config: &Config) -> Result<Self> {
        let store = ArtifactStore::new(&config.paths);
        let model = store.load_model()?;
        let schema = store.load_schema()?;
        let inference_log = InferenceLogWriter::open(&config.paths.inference_log)?;
        Ok(Self::new(model, schema, inference_log))
    }
}
