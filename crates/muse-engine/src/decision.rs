//! Turns the five factors into a routing decision.
//!
//! Two affinity scores are built from the same factors: the image score is
//! the weighted sum of the factors, the text score the weighted sum of their
//! complements. They are not complementary to each other once either is
//! capped, and neither is meant to be.

use muse_contracts::{ConversationContext, ToolDecision, ToolType};
use serde::Serialize;
use tracing::debug;

use crate::scoring::DecisionFactors;

pub const CONFIDENCE_THRESHOLD: f64 = 0.75;
pub const STRONG_THRESHOLD: f64 = 0.65;
pub const AMBIGUOUS_CUTOFF: f64 = 0.6;

const AFFINITY_CAP: f64 = 0.98;
const DECISION_CONFIDENCE_CAP: f64 = 0.95;
const MIN_INPUT_CHARS: usize = 2;
const SHORT_INPUT_CONFIDENCE: f64 = 0.95;
const AMBIGUOUS_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorWeights {
    pub keyword: f64,
    pub pattern: f64,
    pub semantic: f64,
    pub context: f64,
    pub length: f64,
}

pub const WEIGHTS: FactorWeights = FactorWeights {
    keyword: 0.40,
    pattern: 0.30,
    semantic: 0.15,
    context: 0.10,
    length: 0.05,
};

impl FactorWeights {
    fn weigh(&self, factors: &DecisionFactors, map: impl Fn(f64) -> f64) -> f64 {
        map(factors.keyword_score) * self.keyword
            + map(factors.pattern_score) * self.pattern
            + map(factors.semantic_score) * self.semantic
            + map(factors.context_score) * self.context
            + map(factors.length_score) * self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Affinity {
    pub image_score: f64,
    pub text_score: f64,
}

impl Affinity {
    pub fn from_factors(factors: &DecisionFactors) -> Self {
        Self {
            image_score: WEIGHTS.weigh(factors, |factor| factor).min(AFFINITY_CAP),
            text_score: WEIGHTS
                .weigh(factors, |factor| 1.0 - factor)
                .min(AFFINITY_CAP),
        }
    }

    pub fn max_score(&self) -> f64 {
        self.image_score.max(self.text_score)
    }
}

/// Everything the engine computed for one utterance.
///
/// `factors` and `affinity` are absent when the input was rejected as too
/// short before scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub input: String,
    pub factors: Option<DecisionFactors>,
    pub affinity: Option<Affinity>,
    pub decision: ToolDecision,
}

/// Pure, stateless classifier. Safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, user_input: &str, context: &ConversationContext) -> ToolDecision {
        self.analyze(user_input, context).decision
    }

    pub fn analyze(&self, user_input: &str, context: &ConversationContext) -> Analysis {
        let input = user_input.trim().to_lowercase();

        if input.chars().count() < MIN_INPUT_CHARS {
            return Analysis {
                input,
                factors: None,
                affinity: None,
                decision: ToolDecision::new(
                    ToolType::Clarification,
                    SHORT_INPUT_CONFIDENCE,
                    "Input too short to determine intent",
                ),
            };
        }

        let factors = DecisionFactors::compute(&input, context);
        let affinity = Affinity::from_factors(&factors);
        debug!(
            ?factors,
            image_score = affinity.image_score,
            text_score = affinity.text_score,
            "scored utterance"
        );

        Analysis {
            input,
            factors: Some(factors),
            affinity: Some(affinity),
            decision: resolve(affinity),
        }
    }
}

fn resolve(affinity: Affinity) -> ToolDecision {
    let Affinity {
        image_score,
        text_score,
    } = affinity;

    if image_score > text_score {
        if image_score >= CONFIDENCE_THRESHOLD {
            return ToolDecision::new(
                ToolType::ImageGeneration,
                image_score.min(DECISION_CONFIDENCE_CAP),
                format!("Strong visual intent detected (score: {image_score:.2})"),
            );
        }
        if image_score >= STRONG_THRESHOLD {
            return ToolDecision::new(
                ToolType::ImageGeneration,
                image_score,
                format!("Visual content indicated by multiple signals (score: {image_score:.2})"),
            );
        }
    } else {
        if text_score >= CONFIDENCE_THRESHOLD {
            return ToolDecision::new(
                ToolType::TextGeneration,
                text_score.min(DECISION_CONFIDENCE_CAP),
                format!("Strong text generation intent (score: {text_score:.2})"),
            );
        }
        if text_score >= STRONG_THRESHOLD {
            return ToolDecision::new(
                ToolType::TextGeneration,
                text_score,
                format!("Text content indicated by multiple signals (score: {text_score:.2})"),
            );
        }
    }

    let max_score = affinity.max_score();
    if max_score < AMBIGUOUS_CUTOFF {
        return ToolDecision::new(
            ToolType::Clarification,
            AMBIGUOUS_CONFIDENCE,
            format!("Ambiguous input - max confidence only {max_score:.2}"),
        );
    }

    if image_score > text_score {
        ToolDecision::new(
            ToolType::ImageGeneration,
            image_score,
            format!(
                "Slight preference for visual content ({image_score:.2} vs {text_score:.2})"
            ),
        )
    } else {
        ToolDecision::new(
            ToolType::TextGeneration,
            text_score,
            format!("Slight preference for text content ({text_score:.2} vs {image_score:.2})"),
        )
    }
}
