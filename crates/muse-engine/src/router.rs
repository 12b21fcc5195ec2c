use anyhow::Result;
use muse_contracts::{
    ClarificationRequest, ConversationContext, ImageGenerationRequest, TextGenerationRequest,
    ToolDecision, ToolResult, ToolType,
};
use tracing::info;

use crate::decision::DecisionEngine;
use crate::providers::{ClarificationProvider, ImageGenerator, TextGenerator};

/// Messages handed to the text backend as context lines.
pub const TEXT_CONTEXT_MESSAGES: usize = 6;

/// Decision plus whatever the chosen collaborator returned.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedTurn {
    pub decision: ToolDecision,
    pub result: ToolResult,
}

/// Holds no conversation state; every call works only from its arguments.
pub struct Router {
    engine: DecisionEngine,
    text: Box<dyn TextGenerator>,
    image: Box<dyn ImageGenerator>,
    clarification: Box<dyn ClarificationProvider>,
}

impl Router {
    pub fn new(
        text: Box<dyn TextGenerator>,
        image: Box<dyn ImageGenerator>,
        clarification: Box<dyn ClarificationProvider>,
    ) -> Self {
        Self {
            engine: DecisionEngine::new(),
            text,
            image,
            clarification,
        }
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    pub fn text_backend(&self) -> &str {
        self.text.name()
    }

    pub fn image_backend(&self) -> &str {
        self.image.name()
    }

    pub fn set_text_generator(&mut self, text: Box<dyn TextGenerator>) {
        self.text = text;
    }

    pub fn set_image_generator(&mut self, image: Box<dyn ImageGenerator>) {
        self.image = image;
    }

    pub fn route(&self, user_input: &str, context: &ConversationContext) -> Result<RoutedTurn> {
        let decision = self.engine.decide(user_input, context);
        let result = self.dispatch(&decision, user_input, context)?;
        Ok(RoutedTurn { decision, result })
    }

    /// Classifies and dispatches, returning only the collaborator's result.
    pub fn route_and_execute(
        &self,
        user_input: &str,
        context: &ConversationContext,
    ) -> Result<ToolResult> {
        self.route(user_input, context).map(|turn| turn.result)
    }

    /// Calls the collaborator the decision names. Failures are returned
    /// unchanged.
    pub fn dispatch(
        &self,
        decision: &ToolDecision,
        user_input: &str,
        context: &ConversationContext,
    ) -> Result<ToolResult> {
        info!(
            tool = %decision.tool,
            confidence = decision.confidence,
            reasoning = %decision.reasoning,
            "routing turn"
        );
        match decision.tool {
            ToolType::TextGeneration => self.text.generate(&text_request(user_input, context)),
            ToolType::ImageGeneration => self.image.generate(&image_request(user_input, context)),
            ToolType::Clarification => Ok(self.clarification.clarify(&ClarificationRequest {
                user_input: user_input.to_string(),
            })),
        }
    }
}

pub fn text_request(user_input: &str, context: &ConversationContext) -> TextGenerationRequest {
    TextGenerationRequest {
        prompt: user_input.to_string(),
        context: context
            .recent(TEXT_CONTEXT_MESSAGES)
            .iter()
            .map(|message| message.render_line())
            .collect(),
    }
}

pub fn image_request(user_input: &str, context: &ConversationContext) -> ImageGenerationRequest {
    ImageGenerationRequest {
        prompt: user_input.to_string(),
        previous_image_url: context.last_image_url().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::bail;
    use muse_contracts::ChatMessage;

    use super::*;
    use crate::clarification::ClarificationAdvisor;

    #[derive(Default)]
    struct Calls {
        text: Vec<TextGenerationRequest>,
        image: Vec<ImageGenerationRequest>,
    }

    struct StubText {
        calls: Arc<Mutex<Calls>>,
        fail: bool,
    }

    impl TextGenerator for StubText {
        fn name(&self) -> &str {
            "stub-text"
        }

        fn generate(&self, request: &TextGenerationRequest) -> Result<ToolResult> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.text.push(request.clone());
            }
            if self.fail {
                bail!("Replicate API error: Service Unavailable (HTTP 503)");
            }
            Ok(ToolResult {
                kind: ToolType::TextGeneration,
                content: format!("text for {}", request.prompt),
                image_url: None,
                reasoning: "stub text".to_string(),
                model_used: "stub-text".to_string(),
                execution_time: 3,
            })
        }
    }

    struct StubImage {
        calls: Arc<Mutex<Calls>>,
    }

    impl ImageGenerator for StubImage {
        fn name(&self) -> &str {
            "stub-image"
        }

        fn generate(&self, request: &ImageGenerationRequest) -> Result<ToolResult> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.image.push(request.clone());
            }
            Ok(ToolResult {
                kind: ToolType::ImageGeneration,
                content: format!("image for {}", request.prompt),
                image_url: Some("https://img.test/new.png".to_string()),
                reasoning: "stub image".to_string(),
                model_used: "stub-image".to_string(),
                execution_time: 5,
            })
        }
    }

    fn router(fail_text: bool) -> (Router, Arc<Mutex<Calls>>) {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let router = Router::new(
            Box::new(StubText {
                calls: Arc::clone(&calls),
                fail: fail_text,
            }),
            Box::new(StubImage {
                calls: Arc::clone(&calls),
            }),
            Box::new(ClarificationAdvisor::new()),
        );
        (router, calls)
    }

    fn history(lines: usize) -> ConversationContext {
        let mut context = ConversationContext::new("s");
        for idx in 0..lines {
            context.push(ChatMessage::user(format!("message {idx}")));
        }
        context
    }

    #[test]
    fn visual_prompt_reaches_image_backend_with_previous_image() -> anyhow::Result<()> {
        let (router, calls) = router(false);
        let mut context = history(2);
        context.push(ChatMessage::assistant(
            "a fox",
            &ToolResult {
                kind: ToolType::ImageGeneration,
                content: "Generated image for: \"a fox\"".to_string(),
                image_url: Some("https://img.test/fox.png".to_string()),
                reasoning: "r".to_string(),
                model_used: "m".to_string(),
                execution_time: 1,
            },
        ));
        context.push(ChatMessage::user("make it sunset"));

        let prompt = "Create a beautiful sunset landscape painting with vibrant colors";
        let turn = router.route(prompt, &context)?;
        assert_eq!(turn.decision.tool, ToolType::ImageGeneration);
        assert_eq!(turn.result.content, format!("image for {prompt}"));

        let calls = calls.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert!(calls.text.is_empty());
        assert_eq!(calls.image.len(), 1);
        assert_eq!(
            calls.image[0].previous_image_url.as_deref(),
            Some("https://img.test/fox.png")
        );
        Ok(())
    }

    #[test]
    fn text_prompt_gets_last_six_rendered_lines() -> anyhow::Result<()> {
        let (router, calls) = router(false);
        let context = history(8);

        let result = router.route_and_execute("Explain quantum computing", &context)?;
        assert_eq!(result.kind, ToolType::TextGeneration);
        assert_eq!(result.content, "text for Explain quantum computing");
        assert_eq!(result.reasoning, "stub text");

        let calls = calls.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        let sent = &calls.text[0];
        assert_eq!(sent.prompt, "Explain quantum computing");
        assert_eq!(sent.context.len(), 6);
        assert_eq!(sent.context[0], "user: message 2");
        assert_eq!(sent.context[5], "user: message 7");
        Ok(())
    }

    #[test]
    fn ambiguous_input_is_clarified_without_backends() -> anyhow::Result<()> {
        let (router, calls) = router(false);
        let turn = router.route("ok", &ConversationContext::new("s"))?;
        assert_eq!(turn.decision.tool, ToolType::Clarification);
        assert_eq!(turn.result.kind, ToolType::Clarification);
        assert_eq!(turn.result.model_used, "enhanced-clarification-engine");

        let calls = calls.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert!(calls.text.is_empty() && calls.image.is_empty());
        Ok(())
    }

    #[test]
    fn collaborator_failure_propagates_unchanged() {
        let (router, _) = router(true);
        let err = router
            .route("Explain quantum computing", &ConversationContext::new("s"))
            .err()
            .map(|err| format!("{err:#}"));
        assert_eq!(
            err.as_deref(),
            Some("Replicate API error: Service Unavailable (HTTP 503)")
        );
    }

    #[test]
    fn dispatch_follows_a_precomputed_decision() -> anyhow::Result<()> {
        let (router, calls) = router(false);
        let decision = ToolDecision::new(ToolType::ImageGeneration, 0.7, "forced");
        let result = router.dispatch(&decision, "ok", &ConversationContext::new("s"))?;
        assert_eq!(result.kind, ToolType::ImageGeneration);
        assert_eq!(result.content, "image for ok");

        let calls = calls.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        assert!(calls.text.is_empty());
        assert_eq!(calls.image.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_context_sends_no_lines_and_no_previous_image() {
        let context = ConversationContext::new("s");
        assert!(text_request("hi there", &context).context.is_empty());
        assert_eq!(image_request("a fox", &context).previous_image_url, None);
    }
}
