use std::sync::Arc;

use crate::agents::Pipeline;

/// Shared state handed to every handler
///
/// The pipeline is built once at startup and injected here; handlers never
/// construct or mutate it.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<dyn Pipeline>,
    pub service_name: String,
}

impl AppState {
    pub fn new(pipeline: Arc<dyn Pipeline>, service_name: impl Into<String>) -> Self {
        Self {
            pipeline,
            service_name: service_name.into(),
        }
    }
}
