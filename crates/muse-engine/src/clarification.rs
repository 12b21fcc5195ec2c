//! Secondary analyzer behind the clarification tool.
//!
//! Its confidence scale is its own: it shares the keyword lexicon with the
//! decision engine but uses the smaller analysis pattern sets, and it never
//! consults the decision engine's scores.

use muse_contracts::{ClarificationRequest, ToolResult, ToolType};

use crate::lexicon::{self, IMAGE_KEYWORDS, TEXT_KEYWORDS};
use crate::patterns::{TEXTUAL_ANALYSIS_PATTERNS, VISUAL_ANALYSIS_PATTERNS};
use crate::providers::ClarificationProvider;

pub const CLARIFICATION_MODEL: &str = "enhanced-clarification-engine";
pub const CLARIFICATION_EXECUTION_TIME_MS: u64 = 75;
pub const MAX_SUGGESTIONS: usize = 4;

const CONFIDENCE_CAP: f64 = 0.8;
const KEYWORD_HINT_LIMIT: usize = 3;

const OPENER: &str = "I'd love to help you create something amazing! However, I need a bit more clarity to provide exactly what you're looking for.";
const CLOSING_TIP: &str = "**🚀 Pro Tip**: The more specific you are, the better I can help you create exactly what you envision!";

const VISUAL_SUGGESTIONS: [&str; 3] = [
    "Try: \"Create a detailed image of [subject] in [setting] with [style]\"",
    "Example: \"A majestic lion in a savanna at sunset, photorealistic style\"",
    "Or: \"Design a colorful cartoon character wearing [clothing] in [environment]\"",
];

const TEXTUAL_SUGGESTIONS: [&str; 3] = [
    "Try: \"Write a [type] about [topic] for [audience]\"",
    "Example: \"Help me write an engaging email subject line for a product launch\"",
    "Or: \"Create a compelling description for [your specific need]\"",
];

const TOO_BRIEF_SUGGESTIONS: [&str; 2] = [
    "📝 **Too Brief**: Please provide more details about what you need",
    "🎯 **Be Specific**: What type of content are you looking for?",
];

const DETAILED_BUT_UNCLEAR_SUGGESTIONS: [&str; 2] = [
    "🔍 **Clarify Intent**: Your description is detailed but I need to know if you want an image or text",
    "✨ **Choose One**: Add \"create an image of\" or \"write about\" to clarify your intent",
];

/// Which way the advisor thinks the user leans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentLabel {
    Visual,
    Textual,
    PossiblyVisual,
    PossiblyTextual,
}

impl IntentLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Textual => "textual",
            Self::PossiblyVisual => "possibly visual",
            Self::PossiblyTextual => "possibly textual",
        }
    }

    pub fn leans_visual(self) -> bool {
        matches!(self, Self::Visual | Self::PossiblyVisual)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputAnalysis {
    pub confidence: f64,
    pub intent: IntentLabel,
    pub keywords: Vec<&'static str>,
}

/// Ready-to-render clarification: the analysis plus retained suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct Clarification {
    pub analysis: InputAnalysis,
    pub suggestions: Vec<String>,
}

impl Clarification {
    pub fn message(&self) -> String {
        let InputAnalysis {
            confidence,
            intent,
            ..
        } = &self.analysis;
        let percent = confidence * 100.0;

        let intent_line = if *confidence > 0.5 {
            let wants = if intent.leans_visual() {
                "likely want visual content"
            } else {
                "likely want text content"
            };
            format!(
                "🤔 **My Analysis**: Based on your input, you {wants} ({percent:.0}% confidence)."
            )
        } else {
            format!(
                "🤔 **Unclear Intent**: I'm not sure whether you want me to create an image or generate text content ({percent:.0}% confidence)."
            )
        };

        format!(
            "{OPENER}\n\n{intent_line}\n\n**💡 Here's how to get better results:**\n\n{}\n\n---\n\n{CLOSING_TIP}",
            self.suggestions.join("\n\n")
        )
    }

    pub fn reasoning(&self) -> String {
        let confidence = self.analysis.confidence;
        let phrase = if confidence < 0.3 {
            "very ambiguous"
        } else if confidence < 0.6 {
            "somewhat unclear"
        } else {
            "moderately clear"
        };
        format!(
            "Input analysis: {phrase} ({:.1}% confidence)",
            confidence * 100.0
        )
    }

    pub fn into_result(self) -> ToolResult {
        ToolResult {
            kind: ToolType::Clarification,
            content: self.message(),
            image_url: None,
            reasoning: self.reasoning(),
            model_used: CLARIFICATION_MODEL.to_string(),
            execution_time: CLARIFICATION_EXECUTION_TIME_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClarificationAdvisor;

impl ClarificationAdvisor {
    pub fn new() -> Self {
        Self
    }

    /// Lowercases but does not trim; surrounding whitespace counts toward
    /// the length rules.
    pub fn analyze(&self, user_input: &str) -> InputAnalysis {
        let input = user_input.to_lowercase();
        let length = input.chars().count();

        let image_matches = lexicon::matches(IMAGE_KEYWORDS, &input);
        let text_matches = lexicon::matches(TEXT_KEYWORDS, &input);
        let visual_patterns = VISUAL_ANALYSIS_PATTERNS.count_matches(&input);
        let textual_patterns = TEXTUAL_ANALYSIS_PATTERNS.count_matches(&input);

        if image_matches.len() > text_matches.len() || visual_patterns > textual_patterns {
            let length_bonus = if length > 20 { 0.2 } else { 0.0 };
            return InputAnalysis {
                confidence: (image_matches.len() as f64 * 0.2
                    + visual_patterns as f64 * 0.3
                    + length_bonus)
                    .min(CONFIDENCE_CAP),
                intent: IntentLabel::Visual,
                keywords: image_matches,
            };
        }

        if text_matches.len() > image_matches.len() || textual_patterns > visual_patterns {
            let length_bonus = if length < 50 { 0.2 } else { 0.0 };
            return InputAnalysis {
                confidence: (text_matches.len() as f64 * 0.2
                    + textual_patterns as f64 * 0.3
                    + length_bonus)
                    .min(CONFIDENCE_CAP),
                intent: IntentLabel::Textual,
                keywords: text_matches,
            };
        }

        let intent = if length > 30 {
            IntentLabel::PossiblyVisual
        } else {
            IntentLabel::PossiblyTextual
        };
        let mut keywords = image_matches;
        keywords.extend(text_matches);
        InputAnalysis {
            confidence: (length as f64 / 100.0).clamp(0.1, 0.4),
            intent,
            keywords,
        }
    }

    pub fn suggest(&self, user_input: &str, analysis: &InputAnalysis) -> Vec<String> {
        let length = user_input.to_lowercase().chars().count();

        let templates = if analysis.intent.leans_visual() {
            VISUAL_SUGGESTIONS
        } else {
            TEXTUAL_SUGGESTIONS
        };
        let mut suggestions: Vec<String> = templates.iter().map(|s| s.to_string()).collect();

        if length < 5 {
            suggestions.extend(TOO_BRIEF_SUGGESTIONS.iter().map(|s| s.to_string()));
        } else if length > 100 && analysis.confidence < 0.6 {
            suggestions.extend(DETAILED_BUT_UNCLEAR_SUGGESTIONS.iter().map(|s| s.to_string()));
        }

        if !analysis.keywords.is_empty() {
            let hint = analysis
                .keywords
                .iter()
                .take(KEYWORD_HINT_LIMIT)
                .copied()
                .collect::<Vec<_>>()
                .join(", ");
            let implies = if analysis.intent.leans_visual() {
                "this suggests image creation"
            } else {
                "this suggests text generation"
            };
            suggestions.push(format!("🔑 **Detected Keywords**: {hint} - {implies}"));
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    pub fn clarification(&self, user_input: &str) -> Clarification {
        let analysis = self.analyze(user_input);
        let suggestions = self.suggest(user_input, &analysis);
        Clarification {
            analysis,
            suggestions,
        }
    }
}

impl ClarificationProvider for ClarificationAdvisor {
    fn name(&self) -> &str {
        CLARIFICATION_MODEL
    }

    fn clarify(&self, request: &ClarificationRequest) -> ToolResult {
        self.clarification(&request.user_input).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    const LIGHTHOUSE: &str = "I was thinking about the old lighthouse on the northern cliffs and the way the fog rolls in every evening across the bay";

    #[test]
    fn filler_is_possibly_textual_at_floor_confidence() {
        let advisor = ClarificationAdvisor::new();
        for input in ["ok", "hi", "a", "xyz"] {
            let analysis = advisor.analyze(input);
            assert!(close(analysis.confidence, 0.1), "{input}");
            assert_eq!(analysis.intent, IntentLabel::PossiblyTextual);
            assert!(analysis.keywords.is_empty());
        }
    }

    #[test]
    fn text_keywords_lean_textual() {
        let analysis = ClarificationAdvisor::new().analyze("tell me a story");
        assert!(close(analysis.confidence, 0.4));
        assert_eq!(analysis.intent, IntentLabel::Textual);
        assert_eq!(analysis.keywords, vec!["story"]);
    }

    #[test]
    fn short_visual_command_gets_no_length_bonus() {
        let analysis = ClarificationAdvisor::new().analyze("Draw a cat");
        assert!(close(analysis.confidence, 0.2));
        assert_eq!(analysis.intent, IntentLabel::Visual);
        assert_eq!(analysis.keywords, vec!["draw"]);
    }

    #[test]
    fn visual_confidence_is_capped() {
        let analysis =
            ClarificationAdvisor::new().analyze("a red fox in the forest with a lantern, painted");
        assert!(close(analysis.confidence, 0.8));
        assert_eq!(analysis.intent, IntentLabel::Visual);
        assert_eq!(analysis.keywords, vec!["paint"]);
    }

    #[test]
    fn long_text_question_loses_short_bonus() {
        let analysis = ClarificationAdvisor::new().analyze(
            "what should I do about the weather today in the mountains during the long weekend trip we planned for next summer",
        );
        assert!(close(analysis.confidence, 0.2));
        assert_eq!(analysis.intent, IntentLabel::Textual);
        assert_eq!(analysis.keywords, vec!["what"]);
    }

    #[test]
    fn untrimmed_whitespace_counts_toward_length() {
        let advisor = ClarificationAdvisor::new();
        let padded = format!("ok{}", " ".repeat(38));
        let analysis = advisor.analyze(&padded);
        assert!(close(analysis.confidence, 0.4));
        assert_eq!(analysis.intent, IntentLabel::PossiblyVisual);
    }

    #[test]
    fn brief_input_gets_too_brief_prompts_capped_at_four() {
        let clarification = ClarificationAdvisor::new().clarification("ok");
        assert_eq!(clarification.suggestions.len(), MAX_SUGGESTIONS);
        assert_eq!(clarification.suggestions[0], TEXTUAL_SUGGESTIONS[0]);
        assert_eq!(clarification.suggestions[3], TOO_BRIEF_SUGGESTIONS[0]);
    }

    #[test]
    fn keyword_hint_names_matches_and_implied_intent() {
        let clarification = ClarificationAdvisor::new().clarification("tell me a story");
        assert_eq!(clarification.suggestions.len(), 4);
        assert_eq!(
            clarification.suggestions[3],
            "🔑 **Detected Keywords**: story - this suggests text generation"
        );
    }

    #[test]
    fn long_unclear_input_prefers_intent_prompt_over_keyword_hint() {
        let advisor = ClarificationAdvisor::new();
        let analysis = advisor.analyze(LIGHTHOUSE);
        assert!(LIGHTHOUSE.chars().count() > 100);
        assert!(close(analysis.confidence, 0.4));
        assert_eq!(analysis.keywords, vec!["light"]);

        let suggestions = advisor.suggest(LIGHTHOUSE, &analysis);
        assert_eq!(suggestions.len(), 4);
        assert_eq!(suggestions[0], VISUAL_SUGGESTIONS[0]);
        assert_eq!(suggestions[3], DETAILED_BUT_UNCLEAR_SUGGESTIONS[0]);
        assert!(!suggestions.iter().any(|s| s.contains("Detected Keywords")));
    }

    #[test]
    fn reasoning_buckets() {
        let advisor = ClarificationAdvisor::new();
        assert_eq!(
            advisor.clarification("ok").reasoning(),
            "Input analysis: very ambiguous (10.0% confidence)"
        );
        assert_eq!(
            advisor.clarification("tell me a story").reasoning(),
            "Input analysis: somewhat unclear (40.0% confidence)"
        );
        assert_eq!(
            advisor
                .clarification("a red fox in the forest with a lantern, painted")
                .reasoning(),
            "Input analysis: moderately clear (80.0% confidence)"
        );
    }

    #[test]
    fn confident_message_states_likely_intent() {
        let message = ClarificationAdvisor::new()
            .clarification("a red fox in the forest with a lantern, painted")
            .message();
        assert!(message.starts_with(OPENER));
        assert!(message.contains("you likely want visual content (80% confidence)."));
        assert!(message.ends_with(CLOSING_TIP));
    }

    #[test]
    fn unclear_message_still_carries_percentage() {
        let message = ClarificationAdvisor::new().clarification("ok").message();
        assert!(message.contains("**Unclear Intent**"));
        assert!(message.contains("(10% confidence)"));
    }

    #[test]
    fn provider_result_shape() {
        let result = ClarificationAdvisor::new().clarify(&ClarificationRequest {
            user_input: "hmm".to_string(),
        });
        assert_eq!(result.kind, ToolType::Clarification);
        assert_eq!(result.model_used, "enhanced-clarification-engine");
        assert_eq!(result.execution_time, 75);
        assert!(result.image_url.is_none());
        assert!(result.content.contains("% confidence"));
    }

    #[test]
    fn never_more_than_four_suggestions() {
        let advisor = ClarificationAdvisor::new();
        for input in ["", "ok", "Draw a cat", LIGHTHOUSE, "write a story poem essay"] {
            assert!(advisor.clarification(input).suggestions.len() <= MAX_SUGGESTIONS);
        }
    }
}
