//! Prediction requests built around the sample image

use crate::error::ExecutionResult;
use inferprobe_config::{LoadConfig, TargetConfig};
use inferprobe_http::{FilePart, HttpRequest, RequestBody};
use tracing::debug;

const SINGLE_FIELD: &str = "file";
const BATCH_FIELD: &str = "files";
const BATCH_PATH_SUFFIX: &str = "/batch";

/// The sample image and the prediction endpoint it is posted to
#[derive(Debug, Clone)]
pub struct PredictionTarget {
    image: FilePart,
    predict_url: String,
}

impl PredictionTarget {
    pub fn new(image: FilePart, predict_url: impl Into<String>) -> Self {
        Self {
            image,
            predict_url: predict_url.into(),
        }
    }

    /// Read the configured image. Fails with a "test image not found"
    /// error before anything is sent when the file is missing.
    pub async fn load(target: &TargetConfig, load: &LoadConfig) -> ExecutionResult<Self> {
        let image = FilePart::from_path(SINGLE_FIELD, &target.test_image).await?;
        debug!(
            "Loaded test image {} ({} bytes)",
            target.test_image.display(),
            image.bytes.len()
        );
        Ok(Self::new(image, target.endpoint(&load.predict_path)))
    }

    /// Single-image prediction that must answer 200
    pub fn predict_request(&self) -> HttpRequest {
        HttpRequest::post(
            self.predict_url.clone(),
            RequestBody::Multipart(vec![self.image.clone()]),
        )
        .expect_status(200)
    }

    /// Batch prediction uploading the image `count` times
    pub fn batch_request(&self, count: usize) -> HttpRequest {
        let parts = (0..count)
            .map(|i| {
                let mut part = self.image.renamed(BATCH_FIELD);
                part.filename = format!("{}-{}", i, part.filename);
                part
            })
            .collect();

        HttpRequest::post(
            format!("{}{}", self.predict_url, BATCH_PATH_SUFFIX),
            RequestBody::Multipart(parts),
        )
        .expect_status(200)
    }

    /// A text payload posing as an image, which the service must refuse
    pub fn invalid_upload_request(&self) -> HttpRequest {
        let part = FilePart::new(SINGLE_FIELD, "test.txt", "text/plain", b"not an image".to_vec());
        HttpRequest::post(self.predict_url.clone(), RequestBody::Multipart(vec![part]))
            .expect_status(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> PredictionTarget {
        PredictionTarget::new(
            FilePart::new("file", "cat.jpg", "image/jpeg", vec![1, 2, 3]),
            "http://svc/predict",
        )
    }

    #[test]
    fn test_batch_request_repeats_image() {
        let request = target().batch_request(2);

        assert_eq!(request.url, "http://svc/predict/batch");
        match request.body {
            RequestBody::Multipart(parts) => {
                assert_eq!(parts.len(), 2);
                assert!(parts.iter().all(|p| p.field == "files"));
                assert_eq!(parts[1].filename, "1-cat.jpg");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_image_fails_before_sending() {
        let mut config = TargetConfig::default();
        config.test_image = "/nonexistent/test-image.jpg".into();

        let error = PredictionTarget::load(&config, &LoadConfig::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Test image not found"));
    }
}
