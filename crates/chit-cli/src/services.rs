//! HTTP-backed service clients and the CSV ledger sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use chit_core::models::config::ServiceConfig;
use chit_core::{
    ExtractionResult, GenerativeService, LedgerSink, OcrService, ServiceError, SubmissionMeta,
};

/// Environment variable holding the shared API key, if any.
const API_KEY_ENV: &str = "CHIT_API_KEY";

/// Both service endpoints answer `{"text": "..."}`.
#[derive(Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: String,
}

/// OCR service client.
pub struct HttpOcrClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.ocr_endpoint.clone(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

#[async_trait]
impl OcrService for HttpOcrClient {
    async fn recognize_text(&self, image: &[u8]) -> Result<String, ServiceError> {
        let body = json!({ "image": BASE64_STANDARD.encode(image) });
        let text = post_json(&self.client, &self.endpoint, self.api_key.as_deref(), &body).await?;
        debug!("OCR returned {} characters", text.len());
        Ok(text)
    }
}

/// Generative extraction service client.
pub struct HttpVisionClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpVisionClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.vision_endpoint.clone(),
            model: config.vision_model.clone(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

#[async_trait]
impl GenerativeService for HttpVisionClient {
    async fn generate(&self, instruction: &str, image: &[u8]) -> Result<String, ServiceError> {
        let body = json!({
            "model": self.model,
            "instruction": instruction,
            "image": BASE64_STANDARD.encode(image),
        });
        post_json(&self.client, &self.endpoint, self.api_key.as_deref(), &body).await
    }
}

async fn post_json(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: Option<&str>,
    body: &serde_json::Value,
) -> Result<String, ServiceError> {
    let mut request = client.post(endpoint).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    let response = request
        .send()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        });
    }
    let parsed: TextResponse = response
        .json()
        .await
        .map_err(|e| ServiceError::Transport(e.to_string()))?;
    Ok(parsed.text)
}

/// CSV-backed ledger sink; each finished result becomes one row.
pub struct CsvLedger {
    path: PathBuf,
}

impl CsvLedger {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl LedgerSink for CsvLedger {
    async fn record(
        &self,
        result: &ExtractionResult,
        meta: &SubmissionMeta,
    ) -> Result<(), ServiceError> {
        let new_file = !self.path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ServiceError::Ledger(e.to_string()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if new_file {
            writer
                .write_record([
                    "submitted_at",
                    "submitted_by",
                    "outlet",
                    "category",
                    "total_amount",
                    "confidence",
                    "amount_corrected",
                    "original_amount",
                    "items",
                ])
                .map_err(|e| ServiceError::Ledger(e.to_string()))?;
        }

        let items = result
            .items
            .iter()
            .map(|i| format!("{} ({}) {}", i.name, i.quantity, i.price))
            .collect::<Vec<_>>()
            .join("; ");
        writer
            .write_record([
                meta.submitted_at.to_rfc3339(),
                meta.submitted_by.clone(),
                meta.outlet.clone().unwrap_or_default(),
                meta.category.to_string(),
                result.total_amount.to_string(),
                result.confidence.to_string(),
                result.amount_corrected.to_string(),
                result
                    .original_amount
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
                items,
            ])
            .map_err(|e| ServiceError::Ledger(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| ServiceError::Ledger(e.to_string()))?;
        Ok(())
    }
}
