use std::sync::Arc;

use crate::{config::AppConfig, store::SubmissionStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SubmissionStore>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn SubmissionStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
