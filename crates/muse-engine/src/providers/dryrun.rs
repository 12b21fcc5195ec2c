use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use muse_contracts::{ImageGenerationRequest, TextGenerationRequest, ToolResult, ToolType};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{ImageGenerator, TextGenerator};

pub(crate) const TEXT_REASONING: &str = "User requested text content or assistance";
pub(crate) const IMAGE_REASONING: &str = "User requested visual content or described an image idea";

const DRYRUN_IMAGE_SIZE: u32 = 256;

/// Offline text backend. Echoes the prompt so turns can be exercised without
/// a token.
pub struct DryrunTextGenerator {
    name: String,
}

impl DryrunTextGenerator {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl TextGenerator for DryrunTextGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &TextGenerationRequest) -> Result<ToolResult> {
        let started = Instant::now();
        let content = format!(
            "[dryrun] Reply to \"{}\" ({} context line{}).",
            request.prompt,
            request.context.len(),
            if request.context.len() == 1 { "" } else { "s" }
        );
        Ok(ToolResult {
            kind: ToolType::TextGeneration,
            content,
            image_url: None,
            reasoning: TEXT_REASONING.to_string(),
            model_used: self.name.clone(),
            execution_time: started.elapsed().as_millis() as u64,
        })
    }
}

/// Offline image backend. Writes a solid-colour PNG whose colour is derived
/// from the prompt.
pub struct DryrunImageGenerator {
    name: String,
    out_dir: PathBuf,
}

impl DryrunImageGenerator {
    pub fn new(name: &str, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            out_dir: out_dir.into(),
        }
    }
}

impl ImageGenerator for DryrunImageGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &ImageGenerationRequest) -> Result<ToolResult> {
        let started = Instant::now();
        if let Some(previous) = request.previous_image_url.as_deref() {
            debug!(previous, "dryrun image ignores previous image");
        }

        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let stamp = chrono::Utc::now().timestamp_millis();
        let image_path = self
            .out_dir
            .join(format!("image-{stamp}-{}.png", short_id(&request.prompt)));
        write_dryrun_image(&image_path, &request.prompt)?;

        Ok(ToolResult {
            kind: ToolType::ImageGeneration,
            content: format!("Generated image for: \"{}\"", request.prompt),
            image_url: Some(image_path.display().to_string()),
            reasoning: IMAGE_REASONING.to_string(),
            model_used: self.name.clone(),
            execution_time: started.elapsed().as_millis() as u64,
        })
    }
}

fn write_dryrun_image(path: &Path, prompt: &str) -> Result<()> {
    let (r, g, b) = color_from_prompt(prompt);
    let mut image = RgbImage::new(DRYRUN_IMAGE_SIZE, DRYRUN_IMAGE_SIZE);
    for pixel in image.pixels_mut() {
        *pixel = Rgb([r, g, b]);
    }
    image
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    Ok(())
}

fn color_from_prompt(prompt: &str) -> (u8, u8, u8) {
    let digest = Sha256::digest(prompt.as_bytes());
    (digest[0], digest[1], digest[2])
}

fn short_id(prompt: &str) -> String {
    hex::encode(&Sha256::digest(prompt.as_bytes())[..4])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_reply_is_deterministic() -> anyhow::Result<()> {
        let generator = DryrunTextGenerator::new("dryrun-text-1");
        let request = TextGenerationRequest {
            prompt: "tell me a story".to_string(),
            context: vec!["user: tell me a story".to_string()],
        };
        let first = generator.generate(&request)?;
        let second = generator.generate(&request)?;
        assert_eq!(first.content, second.content);
        assert_eq!(
            first.content,
            "[dryrun] Reply to \"tell me a story\" (1 context line)."
        );
        assert_eq!(first.kind, ToolType::TextGeneration);
        assert_eq!(first.model_used, "dryrun-text-1");
        assert_eq!(first.reasoning, TEXT_REASONING);
        Ok(())
    }

    #[test]
    fn image_is_written_to_out_dir() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let out_dir = temp.path().join("images");
        let generator = DryrunImageGenerator::new("dryrun-image-1", &out_dir);
        let result = generator.generate(&ImageGenerationRequest {
            prompt: "a red barn".to_string(),
            previous_image_url: None,
        })?;

        assert_eq!(result.kind, ToolType::ImageGeneration);
        assert_eq!(result.content, "Generated image for: \"a red barn\"");
        let path = PathBuf::from(result.image_url.unwrap_or_default());
        assert!(path.starts_with(&out_dir));
        assert!(path.exists());

        let decoded = image::open(&path)?.to_rgb8();
        assert_eq!(decoded.dimensions(), (DRYRUN_IMAGE_SIZE, DRYRUN_IMAGE_SIZE));
        let (r, g, b) = color_from_prompt("a red barn");
        assert_eq!(decoded.get_pixel(0, 0), &Rgb([r, g, b]));
        Ok(())
    }

    #[test]
    fn colour_depends_only_on_prompt() {
        assert_eq!(color_from_prompt("fox"), color_from_prompt("fox"));
        assert_ne!(color_from_prompt("fox"), color_from_prompt("owl"));
        assert_eq!(short_id("fox").len(), 8);
    }
}
