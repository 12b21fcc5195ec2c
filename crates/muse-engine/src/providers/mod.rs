//! Collaborators a routed turn is dispatched to.
//!
//! One trait per capability. Generators are fallible and their failures are
//! handed back to the caller untouched; clarification always produces a
//! result.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};
use muse_contracts::models::ModelSpec;
use muse_contracts::{
    ClarificationRequest, ImageGenerationRequest, TextGenerationRequest, ToolResult,
};
use thiserror::Error;

pub mod dryrun;
pub mod replicate;

pub use dryrun::{DryrunImageGenerator, DryrunTextGenerator};
pub use replicate::{ReplicateClient, ReplicateImageGenerator, ReplicateTextGenerator};

pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &TextGenerationRequest) -> Result<ToolResult>;
}

pub trait ImageGenerator: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, request: &ImageGenerationRequest) -> Result<ToolResult>;
}

pub trait ClarificationProvider: Send + Sync {
    fn name(&self) -> &str;
    fn clarify(&self, request: &ClarificationRequest) -> ToolResult;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("REPLICATE_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("Replicate API error: {status_text} (HTTP {status})")]
    Api { status: u16, status_text: String },
    #[error("No content received from Replicate")]
    EmptyOutput,
    #[error("Replicate prediction {status}: {detail}")]
    PredictionFailed { status: String, detail: String },
    #[error("Replicate polling timed out after {seconds}s")]
    TimedOut { seconds: u64 },
}

/// Backend name as it appears in the model registry's `provider` column.
pub const DRYRUN: &str = "dryrun";
pub const REPLICATE: &str = "replicate";

/// Builds the text backend a registry entry points at.
pub fn text_generator_for(model: &ModelSpec) -> Result<Box<dyn TextGenerator>> {
    match model.provider.as_str() {
        DRYRUN => Ok(Box::new(DryrunTextGenerator::new(&model.name))),
        REPLICATE => Ok(Box::new(ReplicateTextGenerator::new(
            ReplicateClient::from_env(),
            &model.slug,
        ))),
        other => bail!("Unknown text provider '{other}' for model '{}'", model.name),
    }
}

/// Builds the image backend a registry entry points at. Dry-run images land
/// in `out_dir`.
pub fn image_generator_for(
    model: &ModelSpec,
    out_dir: impl Into<PathBuf>,
) -> Result<Box<dyn ImageGenerator>> {
    match model.provider.as_str() {
        DRYRUN => Ok(Box::new(DryrunImageGenerator::new(&model.name, out_dir))),
        REPLICATE => Ok(Box::new(ReplicateImageGenerator::new(
            ReplicateClient::from_env(),
            &model.slug,
        ))),
        other => bail!("Unknown image provider '{other}' for model '{}'", model.name),
    }
}

pub fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Token lookup shared by the backends and the health check.
pub fn replicate_token() -> Option<String> {
    non_empty_env("REPLICATE_API_TOKEN").or_else(|| non_empty_env("REPLICATE_API_KEY"))
}

/// Last path segment of a model slug, as reported in `modelUsed`.
pub fn model_label(slug: &str) -> &str {
    slug.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(slug)
}
