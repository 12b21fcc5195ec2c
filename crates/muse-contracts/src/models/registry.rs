use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Text,
    Image,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Image => "image",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub provider: String,
    /// Backend-side identifier, e.g. `owner/model` on Replicate.
    pub slug: String,
    pub capabilities: Vec<Capability>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, provider: &str, slug: &str, capabilities: &[Capability]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                provider: provider.to_string(),
                slug: slug.to_string(),
                capabilities: capabilities.to_vec(),
            },
        );
    };

    insert(
        "claude-3.7-sonnet",
        "replicate",
        "anthropic/claude-3.7-sonnet",
        &[Capability::Text],
    );
    insert(
        "flux-schnell",
        "replicate",
        "black-forest-labs/flux-schnell",
        &[Capability::Image],
    );
    insert(
        "llama-3-70b-instruct",
        "replicate",
        "meta/meta-llama-3-70b-instruct",
        &[Capability::Text],
    );
    insert("sdxl", "replicate", "stability-ai/sdxl", &[Capability::Image]);
    insert(
        "dryrun-text-1",
        "dryrun",
        "dryrun-text-1",
        &[Capability::Text],
    );
    insert(
        "dryrun-image-1",
        "dryrun",
        "dryrun-image-1",
        &[Capability::Image],
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_both_capabilities() {
        let registry = ModelRegistry::new(None);
        let text: Vec<String> = registry
            .by_capability(Capability::Text)
            .into_iter()
            .map(|model| model.name)
            .collect();
        assert_eq!(
            text,
            vec!["claude-3.7-sonnet", "llama-3-70b-instruct", "dryrun-text-1"]
        );
        assert_eq!(
            registry.get("flux-schnell").map(|model| model.slug.as_str()),
            Some("black-forest-labs/flux-schnell")
        );
    }

    #[test]
    fn defaults_keep_insertion_order() {
        let registry = ModelRegistry::new(None);
        let names: Vec<&str> = registry
            .list()
            .map(|model| model.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "claude-3.7-sonnet",
                "flux-schnell",
                "llama-3-70b-instruct",
                "sdxl",
                "dryrun-text-1",
                "dryrun-image-1",
            ]
        );
    }

    #[test]
    fn ensure_rejects_wrong_capability() {
        let registry = ModelRegistry::new(None);
        assert!(registry.ensure("sdxl", Capability::Image).is_some());
        assert!(registry.ensure("sdxl", Capability::Text).is_none());
        assert!(registry.ensure("missing", Capability::Text).is_none());
    }
}
