use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use muse_contracts::{ImageGenerationRequest, TextGenerationRequest, ToolResult, ToolType};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::dryrun::{IMAGE_REASONING, TEXT_REASONING};
use super::{model_label, non_empty_env, replicate_token, ImageGenerator, ProviderError, TextGenerator};

const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(120);
const PROMPT_CONTEXT_LINES: usize = 4;

/// Minimal prediction client: create with `Prefer: wait`, poll until the
/// prediction settles.
#[derive(Debug, Clone)]
pub struct ReplicateClient {
    api_base: String,
    token: Option<String>,
    http: HttpClient,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl ReplicateClient {
    pub fn from_env() -> Self {
        let api_base = non_empty_env("REPLICATE_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::new(api_base, replicate_token())
    }

    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            api_base: api_base.into(),
            token,
            http: HttpClient::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_timeout = timeout;
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn predictions_endpoint(&self, slug: &str) -> String {
        format!("{}/models/{slug}/predictions", self.api_base)
    }

    /// Runs one prediction to completion and returns its `output` field.
    pub fn run(&self, slug: &str, input: Value) -> Result<Value> {
        let token = self.token.as_deref().ok_or(ProviderError::MissingToken)?;
        let endpoint = self.predictions_endpoint(slug);
        debug!(%endpoint, "creating prediction");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token)
            .header("Prefer", "wait")
            .json(&json!({ "input": input }))
            .send()
            .with_context(|| format!("Replicate request failed ({endpoint})"))?;
        let mut prediction = response_json_or_error(response)?;

        match prediction_status(&prediction).as_str() {
            "succeeded" => {}
            "starting" | "processing" => {
                let poll_url = prediction
                    .get("urls")
                    .and_then(|urls| urls.get("get"))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| anyhow::anyhow!("Replicate prediction missing poll URL"))?;
                prediction = self.poll_prediction(&poll_url, token)?;
            }
            status => return Err(prediction_failed(status, &prediction).into()),
        }

        Ok(prediction.get("output").cloned().unwrap_or(Value::Null))
    }

    fn poll_prediction(&self, poll_url: &str, token: &str) -> Result<Value> {
        let started = Instant::now();
        loop {
            let response = self
                .http
                .get(poll_url)
                .bearer_auth(token)
                .send()
                .with_context(|| format!("Replicate poll request failed ({poll_url})"))?;
            let payload = response_json_or_error(response)?;
            let status = prediction_status(&payload);
            if status == "succeeded" {
                return Ok(payload);
            }
            if matches!(status.as_str(), "failed" | "canceled") {
                return Err(prediction_failed(&status, &payload).into());
            }
            if started.elapsed() >= self.poll_timeout {
                warn!(%poll_url, "prediction did not settle in time");
                return Err(ProviderError::TimedOut {
                    seconds: self.poll_timeout.as_secs(),
                }
                .into());
            }
            thread::sleep(self.poll_interval);
        }
    }
}

fn prediction_status(prediction: &Value) -> String {
    prediction
        .get("status")
        .and_then(Value::as_str)
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default()
}

fn prediction_failed(status: &str, prediction: &Value) -> ProviderError {
    let detail = prediction
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| prediction.to_string());
    ProviderError::PredictionFailed {
        status: if status.is_empty() { "failed" } else { status }.to_string(),
        detail,
    }
}

fn response_json_or_error(response: HttpResponse) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Api {
            status: status.as_u16(),
            status_text: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        }
        .into());
    }
    let body = response
        .text()
        .context("Replicate response body read failed")?;
    serde_json::from_str(&body).context("Replicate returned invalid JSON payload")
}

/// HTTP-level errors surface as-is; anything else names the failing step.
fn describe_failure(err: anyhow::Error, step: &'static str) -> anyhow::Error {
    if matches!(
        err.downcast_ref::<ProviderError>(),
        Some(ProviderError::Api { .. })
    ) {
        return err;
    }
    err.context(step)
}

/// Folds the trailing context lines into a single chat-style prompt.
pub fn build_text_prompt(request: &TextGenerationRequest) -> String {
    if request.context.is_empty() {
        return request.prompt.clone();
    }
    let skip = request.context.len().saturating_sub(PROMPT_CONTEXT_LINES);
    let context = request.context[skip..].join("\n");
    format!("Context:\n{context}\n\nUser: {}\n\nAssistant:", request.prompt)
}

fn text_from_output(output: &Value) -> Result<String> {
    let text = match output {
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(piece) => piece.clone(),
                other => other.to_string(),
            })
            .collect::<String>(),
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::EmptyOutput.into());
    }
    Ok(trimmed.to_string())
}

fn first_output_url(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => {
            let trimmed = url.trim();
            trimmed.starts_with("http").then(|| trimmed.to_string())
        }
        Value::Array(rows) => rows.iter().find_map(first_output_url),
        Value::Object(obj) => obj
            .get("url")
            .or_else(|| obj.get("output"))
            .and_then(first_output_url),
        _ => None,
    }
}

pub struct ReplicateTextGenerator {
    client: ReplicateClient,
    slug: String,
}

impl ReplicateTextGenerator {
    pub fn new(client: ReplicateClient, slug: &str) -> Self {
        Self {
            client,
            slug: slug.to_string(),
        }
    }
}

impl TextGenerator for ReplicateTextGenerator {
    fn name(&self) -> &str {
        model_label(&self.slug)
    }

    fn generate(&self, request: &TextGenerationRequest) -> Result<ToolResult> {
        let started = Instant::now();
        let prompt = build_text_prompt(request);
        let content = self
            .client
            .run(&self.slug, json!({ "prompt": prompt }))
            .and_then(|output| text_from_output(&output))
            .map_err(|err| describe_failure(err, "Text generation failed"))?;
        let execution_time = started.elapsed().as_millis() as u64;
        info!(model = %self.slug, execution_time, "text generated");

        Ok(ToolResult {
            kind: ToolType::TextGeneration,
            content,
            image_url: None,
            reasoning: TEXT_REASONING.to_string(),
            model_used: model_label(&self.slug).to_string(),
            execution_time,
        })
    }
}

pub struct ReplicateImageGenerator {
    client: ReplicateClient,
    slug: String,
}

impl ReplicateImageGenerator {
    pub fn new(client: ReplicateClient, slug: &str) -> Self {
        Self {
            client,
            slug: slug.to_string(),
        }
    }
}

impl ImageGenerator for ReplicateImageGenerator {
    fn name(&self) -> &str {
        model_label(&self.slug)
    }

    fn generate(&self, request: &ImageGenerationRequest) -> Result<ToolResult> {
        let started = Instant::now();
        if let Some(previous) = request.previous_image_url.as_deref() {
            debug!(previous, "previous image is not forwarded to Replicate");
        }
        let image_url = self
            .client
            .run(&self.slug, json!({ "prompt": request.prompt }))
            .and_then(|output| {
                first_output_url(&output)
                    .ok_or_else(|| anyhow::anyhow!("No valid image URL received from Replicate"))
            })
            .map_err(|err| describe_failure(err, "Image generation failed"))?;
        let execution_time = started.elapsed().as_millis() as u64;
        info!(model = %self.slug, execution_time, "image generated");

        Ok(ToolResult {
            kind: ToolType::ImageGeneration,
            content: format!("Generated image for: \"{}\"", request.prompt),
            image_url: Some(image_url),
            reasoning: IMAGE_REASONING.to_string(),
            model_used: model_label(&self.slug).to_string(),
            execution_time,
        })
    }
}
