//! Structural regex predicates over the utterance.
//!
//! Only match / no-match is used; capture groups carry no meaning. Word
//! classes and boundaries are ASCII-only, so a word like "café" ends at the
//! accented letter.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    fn compile(sources: &[&str]) -> Self {
        Self {
            patterns: sources
                .iter()
                .map(|source| {
                    Regex::new(&format!("(?i){}", ascii_words(source)))
                        .expect("valid structural pattern")
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of predicates that match somewhere in `input`.
    pub fn count_matches(&self, input: &str) -> usize {
        self.patterns
            .iter()
            .filter(|pattern| pattern.is_match(input))
            .count()
    }
}

fn ascii_words(source: &str) -> String {
    source.replace(r"\w", r"(?-u:\w)").replace(r"\b", r"(?-u:\b)")
}

/// Primary visual predicates used by the decision engine.
pub static IMAGE_PATTERNS: LazyLock<PatternSet> =
    LazyLock::new(|| PatternSet::compile(IMAGE_PATTERNS_SRC));

/// Primary textual predicates used by the decision engine.
pub static TEXT_PATTERNS: LazyLock<PatternSet> =
    LazyLock::new(|| PatternSet::compile(TEXT_PATTERNS_SRC));

/// Smaller visual set used only by the clarification advisor.
pub static VISUAL_ANALYSIS_PATTERNS: LazyLock<PatternSet> =
    LazyLock::new(|| PatternSet::compile(VISUAL_ANALYSIS_PATTERNS_SRC));

/// Smaller textual set used only by the clarification advisor.
pub static TEXTUAL_ANALYSIS_PATTERNS: LazyLock<PatternSet> =
    LazyLock::new(|| PatternSet::compile(TEXTUAL_ANALYSIS_PATTERNS_SRC));

const IMAGE_PATTERNS_SRC: &[&str] = &[
    r"\b(a|an|the)\s+\w+\s+(in|on|at|under|over|beside|near|with|holding|wearing)\s+\w+",
    r"\b(beautiful|stunning|amazing|gorgeous|elegant|dramatic|epic)\s+\w+",
    r"\b(red|blue|green|yellow|orange|purple|pink|black|white|bright|dark|colorful)\s+\w+",
    r"\b(tall|short|big|small|huge|tiny|massive|giant|miniature)\s+\w+",
    r"\b(old|new|ancient|modern|vintage|futuristic|classic)\s+\w+",
    r"\b(realistic|abstract|cartoon|anime|digital|watercolor|oil\s+painting)\b",
    r"\b(portrait|landscape|closeup|wide\s+shot|aerial\s+view)\b",
    r"\b(lighting|shadows|highlights|contrast|composition)\b",
    r"\b(create|make|generate|produce|design|build|craft)\s+(a|an|some)\s+\w+",
    r"\b(draw|paint|sketch|illustrate|render|visualize)\s+\w+",
    r"\b(show\s+me|I\s+want\s+to\s+see|display)\s+\w+",
    r"\w+\s+(standing|sitting|running|flying|walking|lying)\s+(in|on|at)\s+\w+",
    r"\w+\s+with\s+\w+\s+(background|setting|environment)",
    r"\b(peaceful|serene|chaotic|dramatic|mysterious|magical|dreamy)\s+\w+",
    r"\b(sunset|sunrise|storm|rain|snow|fog|mist)\b",
];

const TEXT_PATTERNS_SRC: &[&str] = &[
    r"\b(write|compose|create|draft|generate)\s+(a|an|some)\s+(title|headline|description|story|article|email|letter)",
    r"\b(help\s+me\s+write|assist\s+with\s+writing|need\s+help\s+writing)",
    r"\bwrite\s+about\s+\w+",
    r"\b(improve|enhance|optimize|rewrite|edit|revise|polish)\s+\w+",
    r"\b(make\s+it\s+better|sound\s+more|more\s+professional)",
    r"\b(explain|describe|tell\s+me\s+about|what\s+is|how\s+to|why\s+does)",
    r"\b(define|clarify|elaborate|detail)\s+\w+",
    r"\b(send|email|message|communicate|inform|notify)\s+\w+",
    r"\bI\s+need\s+to\s+(say|tell|write|communicate)",
    r"\b(blog\s+post|article|essay|report|summary|review|analysis)",
    r"\b(social\s+media|marketing|advertising|promotional)\s+\w+",
];

const VISUAL_ANALYSIS_PATTERNS_SRC: &[&str] = &[
    r"\b(a|an|the)\s+\w+\s+(in|on|at|with|holding|wearing)\s+\w+",
    r"\b(red|blue|green|yellow|bright|dark|colorful)\s+\w+",
    r"\b(beautiful|amazing|stunning|creative|detailed)\s+\w+",
    r"\b(tall|short|big|small|huge|tiny)\s+\w+",
];

const TEXTUAL_ANALYSIS_PATTERNS_SRC: &[&str] = &[
    r"\b(write|help|explain|describe|tell)\s+(me\s+)?(about|how|what|why)",
    r"\b(need\s+help|assistance|support)\s+with",
    r"\b(create|write|compose)\s+(a|an|some)\s+(title|story|article|email)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sets_compile_with_expected_sizes() {
        assert_eq!(IMAGE_PATTERNS.len(), 15);
        assert_eq!(TEXT_PATTERNS.len(), 11);
        assert_eq!(VISUAL_ANALYSIS_PATTERNS.len(), 4);
        assert_eq!(TEXTUAL_ANALYSIS_PATTERNS.len(), 3);
    }

    #[test]
    fn visual_prompt_hits_several_image_patterns() {
        let input = "create a beautiful sunset landscape painting with vibrant colors";
        assert_eq!(IMAGE_PATTERNS.count_matches(input), 4);
        assert_eq!(TEXT_PATTERNS.count_matches(input), 0);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(IMAGE_PATTERNS.count_matches("A Fox Sitting On A Log"), 1);
        assert_eq!(TEXT_PATTERNS.count_matches("Write About Rust"), 1);
    }

    #[test]
    fn writing_request_hits_text_patterns() {
        let input = "help me write a story about dragons";
        assert!(TEXT_PATTERNS.count_matches(input) >= 2);
        assert!(TEXTUAL_ANALYSIS_PATTERNS.count_matches(input) >= 1);
    }

    #[test]
    fn word_classes_stop_at_non_ascii_letters() {
        assert_eq!(IMAGE_PATTERNS.count_matches("the cafe in paris"), 1);
        assert_eq!(IMAGE_PATTERNS.count_matches("the café in paris"), 0);
        assert_eq!(ascii_words(r"\b(a|an)\s+\w+"), r"(?-u:\b)(a|an)\s+(?-u:\w)+");
    }

    #[test]
    fn filler_matches_nothing() {
        for set in [
            &*IMAGE_PATTERNS,
            &*TEXT_PATTERNS,
            &*VISUAL_ANALYSIS_PATTERNS,
            &*TEXTUAL_ANALYSIS_PATTERNS,
        ] {
            assert_eq!(set.count_matches("ok"), 0);
        }
    }
}
