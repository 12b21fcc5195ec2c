//! Word lists for substring scoring.
//!
//! Entries are matched with plain `contains` against lowercased input, so a
//! short term inside a longer word still counts. Lists may repeat a term;
//! every entry counts once.

/// Visual vocabulary: media, styles, composition, subjects, aesthetics.
pub static IMAGE_KEYWORDS: &[&str] = &[
    "image", "picture", "photo", "visual", "graphic", "illustration", "artwork", "drawing",
    "sketch", "painting", "render", "design", "create", "generate", "make", "produce", "craft",
    "build", "construct", "develop", "draw", "paint", "sketch", "illustrate", "design", "render",
    "visualize", "depict", "portray", "show", "display", "present", "exhibit", "demonstrate",
    "compose", "arrange", "layout", "style", "fashion", "form", "shape", "color", "colors",
    "colorful", "bright", "vibrant", "vivid", "neon", "dark", "light", "shadow", "highlight",
    "contrast", "saturation", "texture", "pattern", "gradient", "shade", "tone", "hue",
    "realistic", "abstract", "cartoon", "anime", "manga", "comic", "pixel", "watercolor", "oil",
    "acrylic", "digital", "3d", "photorealistic", "surreal", "fantasy", "sci-fi", "vintage",
    "modern", "minimalist", "detailed", "stylized", "artistic", "creative", "beautiful",
    "stunning", "portrait", "landscape", "closeup", "wide", "panoramic", "aerial", "perspective",
    "angle", "view", "scene", "composition", "frame", "background", "foreground", "centered",
    "symmetrical", "asymmetrical", "resolution", "quality", "sharp", "crisp", "detailed", "smooth",
    "professional", "studio", "lighting", "exposure", "focus", "depth", "character", "person",
    "face", "animal", "creature", "object", "item", "building", "architecture", "nature",
    "outdoor", "indoor", "environment", "logo", "icon", "symbol", "emblem", "badge", "banner",
    "poster", "beautiful", "gorgeous", "stunning", "amazing", "incredible", "awesome", "elegant",
    "sophisticated", "dramatic", "epic", "magical", "mystical", "peaceful", "serene", "energetic",
    "dynamic", "powerful", "bold",
];

/// Writing vocabulary: content types, editing verbs, questions, tone.
pub static TEXT_KEYWORDS: &[&str] = &[
    "write", "text", "content", "copy", "description", "caption", "title", "heading", "headline",
    "subtitle", "paragraph", "sentence", "phrase", "word", "letter", "message", "note", "document",
    "article", "blog", "story", "essay", "script", "dialogue", "narrative", "novel", "poem",
    "email", "letter", "memo", "report", "summary", "review", "analysis", "proposal",
    "presentation", "speech", "announcement", "press", "news", "compose", "draft", "edit",
    "revise", "rewrite", "proofread", "format", "structure", "organize", "outline", "brainstorm",
    "develop", "expand", "help", "assist", "support", "guide", "advise", "suggest", "recommend",
    "explain", "how", "what", "why", "when", "where", "who", "which", "clarify", "describe",
    "define", "elaborate", "detail", "improve", "enhance", "optimize", "refine", "polish",
    "perfect", "communicate", "convey", "express", "share", "inform", "notify", "announce",
    "advertise", "promote", "market", "sell", "persuade", "convince", "argue", "debate", "discuss",
    "explain", "teach", "engaging", "compelling", "persuasive", "informative", "educational",
    "entertaining", "professional", "formal", "casual", "friendly", "creative", "original",
    "unique", "catchy", "memorable", "impactful",
];

pub static VISUAL_DESCRIPTORS: &[&str] = &[
    "beautiful", "colorful", "bright", "dark", "tall", "short", "big", "small", "round", "square",
    "smooth", "rough", "shiny", "matte", "transparent", "opaque", "detailed", "simple", "complex",
    "elegant", "dramatic",
];

/// Matched only when surrounded by single spaces.
pub static SPATIAL_PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "under", "over", "beside", "near", "behind", "front",
];

/// Entries of `words` contained in `input`, in list order.
pub fn matches<'a>(words: &[&'a str], input: &str) -> Vec<&'a str> {
    words
        .iter()
        .copied()
        .filter(|word| input.contains(word))
        .collect()
}

pub fn count(words: &[&str], input: &str) -> usize {
    words.iter().filter(|word| input.contains(*word)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(IMAGE_KEYWORDS.len(), 152);
        assert_eq!(TEXT_KEYWORDS.len(), 113);
        assert_eq!(VISUAL_DESCRIPTORS.len(), 21);
        assert_eq!(SPATIAL_PREPOSITIONS.len(), 9);
    }

    #[test]
    fn entries_are_lowercase() {
        for word in IMAGE_KEYWORDS
            .iter()
            .chain(TEXT_KEYWORDS)
            .chain(VISUAL_DESCRIPTORS)
            .chain(SPATIAL_PREPOSITIONS)
        {
            assert_eq!(*word, word.to_lowercase());
        }
    }

    #[test]
    fn substring_matching_counts_embedded_terms() {
        // "show" hides "how"; "painting" hides "paint".
        assert!(matches(TEXT_KEYWORDS, "show").contains(&"how"));
        assert!(count(IMAGE_KEYWORDS, "painting") >= 2);
    }

    #[test]
    fn repeated_entries_count_twice() {
        assert_eq!(count(IMAGE_KEYWORDS, "sketch"), 2);
        assert_eq!(matches(IMAGE_KEYWORDS, "sketch"), vec!["sketch", "sketch"]);
    }

    #[test]
    fn nothing_matches_filler() {
        assert_eq!(count(IMAGE_KEYWORDS, "ok"), 0);
        assert_eq!(count(TEXT_KEYWORDS, "ok"), 0);
    }
}
