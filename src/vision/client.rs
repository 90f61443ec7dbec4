//! HTTP client for the vision provider's image-analysis endpoint.
//!
//! Speaks the analyze API shape the signal model expects: one POST per
//! image requesting tags, objects, and dense captions. Local image paths
//! are uploaded as raw bytes; http(s) URIs are passed through by reference.
//! Response parsing is lenient — missing result groups become empty lists.

use futures_util::future::BoxFuture;

use super::VisionError;
use crate::pipeline::refine::VisionAnalyzer;
use crate::pipeline::signal::RawSignal;

/// Features requested from the provider on every analyze call.
const ANALYZE_FEATURES: &str = "tags,objects,denseCaptions,read";

/// API version pinned for the analyze endpoint.
const API_VERSION: &str = "2023-10-01";

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Async client for the image-analysis endpoint.
pub struct VisionApiClient {
    endpoint: String,
    key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl VisionApiClient {
    /// Create a client for the given endpoint and subscription key.
    pub fn new(endpoint: &str, key: &str) -> Self {
        Self::with_timeout(endpoint, key, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(endpoint: &str, key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Build a client from `PANTRYLENS_VISION_ENDPOINT` and
    /// `PANTRYLENS_VISION_KEY`.
    pub fn from_env() -> Result<Self, VisionError> {
        let endpoint = std::env::var("PANTRYLENS_VISION_ENDPOINT")
            .map_err(|_| VisionError::Configuration("PANTRYLENS_VISION_ENDPOINT".into()))?;
        let key = std::env::var("PANTRYLENS_VISION_KEY")
            .map_err(|_| VisionError::Configuration("PANTRYLENS_VISION_KEY".into()))?;
        Ok(Self::new(&endpoint, &key))
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/computervision/imageanalysis:analyze?features={}&api-version={}",
            self.endpoint, ANALYZE_FEATURES, API_VERSION
        )
    }

    /// Analyze one image, local path or remote URL.
    pub async fn analyze_image(&self, uri: &str) -> Result<RawSignal, VisionError> {
        let start = std::time::Instant::now();

        let request = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.key);

        let request = if uri.starts_with("http://") || uri.starts_with("https://") {
            request.json(&serde_json::json!({ "url": uri }))
        } else {
            let bytes = tokio::fs::read(uri).await?;
            request
                .header("Content-Type", "application/octet-stream")
                .body(bytes)
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                VisionError::Connection(self.endpoint.clone())
            } else if e.is_timeout() {
                VisionError::Timeout(self.timeout_secs)
            } else {
                VisionError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VisionError::ResponseParsing(e.to_string()))?;
        let signal = RawSignal::from_provider_json(value);

        tracing::info!(
            uri = %uri,
            elapsed_ms = %start.elapsed().as_millis(),
            tags = signal.tags.len(),
            captions = signal.captions.len(),
            objects = signal.objects.len(),
            "Vision analysis complete"
        );
        Ok(signal)
    }
}

impl VisionAnalyzer for VisionApiClient {
    fn analyze<'a>(&'a self, uri: &'a str) -> BoxFuture<'a, Result<RawSignal, VisionError>> {
        Box::pin(self.analyze_image(uri))
    }
}
