use crate::cover_form::BookCoverForm;
use crate::gemini_client::{ApiError, GeminiClient};
use crate::prompt;
use crate::upload::UploadedImage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

/// Produces one image for one prompt. The remote service is opaque: it either
/// hands back image bytes or fails.
#[async_trait]
pub trait CoverGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        references: &[UploadedImage],
    ) -> Result<Vec<u8>, ApiError>;
}

#[async_trait]
impl CoverGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        references: &[UploadedImage],
    ) -> Result<Vec<u8>, ApiError> {
        self.generate_image(prompt, aspect_ratio, references).await
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub id: Uuid,
    pub bytes: Arc<[u8]>,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            bytes: bytes.into(),
            generated_at: Utc::now(),
        }
    }

    /// Eight hex characters, used in labels and file names.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

#[derive(Debug, Clone)]
pub enum VariantOutcome {
    Generated(GeneratedImage),
    Failed { variant: usize, reason: String },
}

/// Outcomes in request order, one per requested variant.
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub outcomes: Vec<VariantOutcome>,
}

impl GenerationReport {
    pub fn requested(&self) -> usize {
        self.outcomes.len()
    }

    pub fn images(&self) -> Vec<GeneratedImage> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                VariantOutcome::Generated(image) => Some(image.clone()),
                VariantOutcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<(usize, &str)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                VariantOutcome::Failed { variant, reason } => Some((*variant, reason.as_str())),
                VariantOutcome::Generated(_) => None,
            })
            .collect()
    }

    pub fn is_total_failure(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| matches!(outcome, VariantOutcome::Failed { .. }))
    }
}

/// Issues every variant request at once and waits for all of them.
///
/// A failed variant never fails the batch; it shows up as
/// `VariantOutcome::Failed` in the report.
pub async fn generate_variants(generator: Arc<dyn CoverGenerator>, form: &BookCoverForm) -> GenerationReport {
    let base = prompt::base_prompt(form);
    let aspect_ratio = form.format.aspect_ratio();
    let count = form.variant_count() as usize;

    log::info!(
        "Requesting {} variant(s) of {:?} at {}",
        count,
        form.format,
        aspect_ratio
    );

    let tasks = (0..count).map(|index| {
        let generator = generator.clone();
        let prompt = prompt::variant_prompt(&base, index);
        let references = form.references.as_slice();
        async move {
            match generator.generate(&prompt, aspect_ratio, references).await {
                Ok(bytes) => VariantOutcome::Generated(GeneratedImage::new(bytes)),
                Err(e) => {
                    log::error!("Variant {} failed: {}", index + 1, e);
                    VariantOutcome::Failed {
                        variant: index,
                        reason: e.to_string(),
                    }
                }
            }
        }
    });

    GenerationReport {
        outcomes: join_all(tasks).await,
    }
}
