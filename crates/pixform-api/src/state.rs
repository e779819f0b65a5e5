//! Application state shared by all handlers.

use pixform_core::Config;
use pixform_processing::{ImageService, TransformPool};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub images: ImageService,
    pub pool: TransformPool,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let images = ImageService::new(config.compress_quality_ceiling);
        let pool = TransformPool::new(config.max_concurrent_transforms);
        Self {
            config: Arc::new(config),
            images,
            pool,
        }
    }
}
