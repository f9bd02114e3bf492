//! Text recognition through an HTTP OCR service.
//!
//! Request body: `{"image": "data:image/png;base64,..."}`
//! Response body: `{"text": "..."}`

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

use super::{RecognitionResult, TextRecognizer};
use crate::capture::RawImage;
use crate::error::{PipelineError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct OcrRequest {
    image: String,
}

#[derive(Deserialize)]
struct OcrResponse {
    text: String,
}

/// Posts each image to a remote OCR endpoint.
#[derive(Clone, Debug)]
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ocr-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::RecognitionFailed(format!("HTTP client setup: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextRecognizer for HttpRecognizer {
    async fn recognize(&self, image: &RawImage) -> Result<RecognitionResult> {
        let body = OcrRequest {
            image: png_data_url(image)?,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::RecognitionFailed(format!("OCR request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::RecognitionFailed(format!(
                "OCR service returned HTTP {}",
                status
            )));
        }

        let parsed: OcrResponse = response.json().await.map_err(|e| {
            PipelineError::RecognitionFailed(format!("invalid OCR response: {}", e))
        })?;

        Ok(RecognitionResult { text: parsed.text })
    }
}

/// Encodes an image as a `data:image/png;base64,` URL.
pub fn png_data_url(image: &RawImage) -> Result<String> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PipelineError::RecognitionFailed(format!("failed to encode image: {}", e)))?;

    let encoded = general_purpose::STANDARD.encode(&buffer);
    Ok(format!("data:image/png;base64,{}", encoded))
}
