//! Extraction pipeline: sequences OCR, generative extraction, and
//! cross-validation per order category.
//!
//! One invocation corresponds to one submitted image and runs to
//! completion before returning. The pipeline holds no mutable state;
//! concurrent invocations share nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result, ServiceError};
use crate::models::config::ChitConfig;
use crate::models::receipt::{
    Confidence, ExtractionPath, ExtractionResult, GenerativeExtraction, OrderCategory,
    SubmissionMeta,
};
use crate::services::{GenerativeService, LedgerSink, OcrService};

use super::generative::{instruction_for, parse_response};
use super::rules::amounts::CandidateScanner;
use super::rules::items::ItemParser;
use super::validator::CrossValidator;

/// The extraction orchestrator.
///
/// Collaborator services are injected at construction so the heuristic
/// stages stay deterministic under test.
pub struct ReceiptPipeline {
    ocr: Arc<dyn OcrService>,
    model: Arc<dyn GenerativeService>,
    config: ChitConfig,
}

impl ReceiptPipeline {
    pub fn new(
        ocr: Arc<dyn OcrService>,
        model: Arc<dyn GenerativeService>,
        config: ChitConfig,
    ) -> Self {
        Self { ocr, model, config }
    }

    /// Extract using the configured per-category trust policy.
    pub async fn extract(
        &self,
        image: &[u8],
        category: OrderCategory,
    ) -> Result<ExtractionResult> {
        let skip = self
            .config
            .validation
            .trust_generative
            .contains(&category);
        self.extract_with_policy(image, category, skip).await
    }

    /// Extract and hand the finished result to the ledger sink.
    pub async fn extract_and_record(
        &self,
        image: &[u8],
        meta: &SubmissionMeta,
        sink: &dyn LedgerSink,
    ) -> Result<ExtractionResult> {
        let result = self.extract(image, meta.category).await?;
        sink.record(&result, meta).await?;
        Ok(result)
    }

    /// Extract with an explicit validation policy.
    pub async fn extract_with_policy(
        &self,
        image: &[u8],
        category: OrderCategory,
        skip_validation: bool,
    ) -> Result<ExtractionResult> {
        let start = Instant::now();

        if image.len() > self.config.services.max_image_bytes {
            return Err(ServiceError::Payload(format!(
                "image is {} bytes, cap is {}",
                image.len(),
                self.config.services.max_image_bytes
            ))
            .into());
        }

        let mut warnings = Vec::new();
        let generated = match self.generative_extract(category, image).await {
            Ok(extraction) => Some(extraction),
            Err(e) => {
                warn!("{e}; falling back to OCR heuristics");
                warnings.push(e.to_string());
                None
            }
        };

        let mut result = match generated {
            Some(extraction) if skip_validation => {
                self.finish_trusted(extraction, image, warnings).await
            }
            Some(extraction) => self.finish_validated(extraction, image, warnings).await,
            None => self.finish_heuristic(category, image, warnings).await?,
        };

        // Out-of-range totals stay in the result but never at full trust.
        if result.total_amount < self.config.scanner.min_amount
            || result.total_amount > self.config.scanner.max_amount
        {
            result.warnings.push(format!(
                "resolved amount {} is outside the plausible range",
                result.total_amount
            ));
            result.confidence = Confidence::Low;
        }

        result.processing_time_ms = Some(start.elapsed().as_millis() as u64);
        info!(
            "extracted {} at {:?} confidence via {:?}",
            result.total_amount, result.confidence, result.path
        );
        Ok(result)
    }

    /// Run the generative service and schema-check its response.
    /// Transport failures escalate only after retries exhaust; parse
    /// failures are deterministic and never retried.
    async fn generative_extract(
        &self,
        category: OrderCategory,
        image: &[u8],
    ) -> std::result::Result<GenerativeExtraction, ExtractionError> {
        let raw = self
            .generate_with_retries(instruction_for(category), image)
            .await
            .map_err(|e| {
                ExtractionError::GenerativeFailed(format!("service unavailable: {e}"))
            })?;
        parse_response(&raw)
    }

    /// Trusted category: the generative result is taken as-is, with an
    /// optional best-effort OCR capture kept for the audit trail.
    async fn finish_trusted(
        &self,
        extraction: GenerativeExtraction,
        image: &[u8],
        warnings: Vec<String>,
    ) -> ExtractionResult {
        let ocr_text = if self.config.services.audit_ocr {
            // A failed capture must never fail the call.
            self.ocr
                .recognize_text(image)
                .await
                .ok()
                .filter(|t| !t.trim().is_empty())
        } else {
            None
        };
        ExtractionResult {
            total_amount: extraction.total_amount,
            items: extraction.items,
            confidence: Confidence::High,
            amount_corrected: false,
            original_amount: None,
            path: ExtractionPath::ValidationSkipped,
            warnings,
            ocr_text,
            processing_time_ms: None,
        }
    }

    async fn finish_validated(
        &self,
        extraction: GenerativeExtraction,
        image: &[u8],
        mut warnings: Vec<String>,
    ) -> ExtractionResult {
        let ocr_text = match self.ocr_with_retries(image).await {
            Ok(text) => text,
            Err(e) => {
                warnings.push(format!("OCR unavailable, validating against empty text: {e}"));
                String::new()
            }
        };

        let outcome =
            CrossValidator::new(&self.config).validate(extraction.total_amount, &ocr_text);
        if !outcome.is_valid {
            warnings.push(format!(
                "OCR disagrees with the model amount {}; reporting {}",
                extraction.total_amount, outcome.resolved_amount
            ));
        }

        let corrected = (outcome.resolved_amount - extraction.total_amount).abs()
            > self.config.validation.exact_tolerance;
        ExtractionResult {
            total_amount: outcome.resolved_amount,
            items: extraction.items,
            confidence: outcome.confidence,
            amount_corrected: corrected,
            original_amount: corrected.then_some(extraction.total_amount),
            path: ExtractionPath::Validated,
            warnings,
            ocr_text: (!ocr_text.trim().is_empty()).then_some(ocr_text),
            processing_time_ms: None,
        }
    }

    /// Generative extraction failed; scan the OCR text alone. With no
    /// model amount there is nothing to cross-validate, so confidence is
    /// whatever the scanner implies.
    async fn finish_heuristic(
        &self,
        category: OrderCategory,
        image: &[u8],
        warnings: Vec<String>,
    ) -> Result<ExtractionResult> {
        let text = match self.fallback_text(image).await {
            Ok(text) => text,
            Err(e) => {
                debug!("heuristic fallback has nothing to scan: {e}");
                return Err(ExtractionError::NoAmountDeterminable.into());
            }
        };

        let scanner = CandidateScanner::new(self.config.scanner.clone());
        let Some(best) = scanner.best(&text) else {
            return Err(ExtractionError::NoAmountDeterminable.into());
        };
        let items = if category.is_itemized() {
            ItemParser::new(self.config.items.clone()).parse(&text)
        } else {
            Vec::new()
        };
        let confidence = if best.has_context_keyword {
            Confidence::Medium
        } else {
            Confidence::Low
        };
        Ok(ExtractionResult {
            total_amount: best.value,
            items,
            confidence,
            amount_corrected: false,
            original_amount: None,
            path: ExtractionPath::HeuristicOnly,
            warnings,
            ocr_text: Some(text),
            processing_time_ms: None,
        })
    }

    async fn fallback_text(
        &self,
        image: &[u8],
    ) -> std::result::Result<String, ExtractionError> {
        let text = self.ocr_with_retries(image).await.map_err(|e| {
            warn!("OCR service failed after retries: {e}");
            ExtractionError::NoTextFound
        })?;
        if text.trim().is_empty() {
            return Err(ExtractionError::NoTextFound);
        }
        Ok(text)
    }

    async fn ocr_with_retries(
        &self,
        image: &[u8],
    ) -> std::result::Result<String, ServiceError> {
        let attempts = self.config.services.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.ocr.recognize_text(image).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < attempts => {
                    warn!("OCR attempt {attempt}/{attempts} failed: {e}");
                    sleep(self.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn generate_with_retries(
        &self,
        instruction: &str,
        image: &[u8],
    ) -> std::result::Result<String, ServiceError> {
        let attempts = self.config.services.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.model.generate(instruction, image).await {
                Ok(raw) => return Ok(raw),
                Err(e) if attempt < attempts => {
                    warn!("generative attempt {attempt}/{attempts} failed: {e}");
                    sleep(self.backoff(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.config.services.retry_delay_ms * attempt as u64)
    }
}
