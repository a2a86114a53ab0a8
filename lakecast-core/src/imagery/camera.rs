use async_trait::async_trait;

use crate::{error::ReportError, model::ImageRef};

use super::ImageSource;

/// Fixed snapshot URLs handed to the model as remote attachments.
#[derive(Debug, Clone)]
pub struct CameraSource {
    urls: Vec<String>,
}

impl CameraSource {
    pub fn new(urls: Vec<String>) -> Self {
        Self { urls }
    }
}

#[async_trait]
impl ImageSource for CameraSource {
    async fn acquire(&self) -> Result<Vec<ImageRef>, ReportError> {
        if self.urls.is_empty() {
            log::error!("No camera URLs configured");
            return Err(ReportError::StreamUnavailable("no camera URLs configured".into()));
        }

        log::info!("Using {} camera image(s)", self.urls.len());
        Ok(self.urls.iter().cloned().map(ImageRef::Remote).collect())
    }
}
