//! The five independent factors behind a routing decision.
//!
//! Every factor lands in `[0, 1]`; values above 0.5 lean visual, below lean
//! textual. Inputs are expected lowercased and trimmed.

use muse_contracts::{ConversationContext, ToolType};
use serde::{Deserialize, Serialize};

use crate::lexicon::{self, IMAGE_KEYWORDS, SPATIAL_PREPOSITIONS, TEXT_KEYWORDS, VISUAL_DESCRIPTORS};
use crate::patterns::{IMAGE_PATTERNS, TEXT_PATTERNS};

const NEUTRAL: f64 = 0.5;
const CONTEXT_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionFactors {
    pub keyword_score: f64,
    pub pattern_score: f64,
    pub semantic_score: f64,
    pub context_score: f64,
    pub length_score: f64,
}

impl DecisionFactors {
    pub fn compute(input: &str, context: &ConversationContext) -> Self {
        Self {
            keyword_score: keyword_score(input),
            pattern_score: pattern_score(input),
            semantic_score: semantic_score(input),
            context_score: context_score(context),
            length_score: length_score(input),
        }
    }
}

/// Shared shape of the keyword and pattern factors.
///
/// Neutral with no signal, the visual share otherwise, pushed toward the
/// extremes when only one side has any signal at all.
pub fn balance_score(visual: usize, textual: usize) -> f64 {
    match (visual, textual) {
        (0, 0) => NEUTRAL,
        (v, 0) => (0.8 + v as f64 * 0.1).min(0.95),
        (0, t) => (0.2 - t as f64 * 0.1).max(0.05),
        (v, t) => v as f64 / (v + t) as f64,
    }
}

pub fn keyword_score(input: &str) -> f64 {
    balance_score(
        lexicon::count(IMAGE_KEYWORDS, input),
        lexicon::count(TEXT_KEYWORDS, input),
    )
}

pub fn pattern_score(input: &str) -> f64 {
    balance_score(
        IMAGE_PATTERNS.count_matches(input),
        TEXT_PATTERNS.count_matches(input),
    )
}

/// Descriptor density plus spatial prepositions.
pub fn semantic_score(input: &str) -> f64 {
    let descriptor_count = lexicon::count(VISUAL_DESCRIPTORS, input) as f64;
    let word_count = input.split_whitespace().count().max(1) as f64;
    let adjective_ratio = descriptor_count / word_count;
    let spatial_count = SPATIAL_PREPOSITIONS
        .iter()
        .filter(|prep| input.contains(&format!(" {prep} ")))
        .count() as f64;

    (adjective_ratio * 2.0 + spatial_count * 0.1 + descriptor_count * 0.05).min(1.0)
}

/// Share of recent turns served by image generation, Laplace-smoothed.
///
/// Only the tool recorded in each message's action log counts.
pub fn context_score(context: &ConversationContext) -> f64 {
    if context.is_empty() {
        return NEUTRAL;
    }

    let (mut image_context, mut text_context) = (0usize, 0usize);
    for message in context.recent(CONTEXT_WINDOW) {
        match message.tool_used() {
            Some(ToolType::ImageGeneration) => image_context += 1,
            Some(ToolType::TextGeneration) => text_context += 1,
            _ => {}
        }
    }

    image_context as f64 / (image_context + text_context + 1) as f64
}

pub fn length_score(input: &str) -> f64 {
    match input.chars().count() {
        0..=9 => 0.2,
        10..=29 => 0.4,
        30..=59 => 0.6,
        60..=99 => 0.8,
        _ => 0.9,
    }
}
