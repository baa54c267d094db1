//! Stages backed by the generation capability.

use super::{PreviousOutput, Stage, StageContext};
use crate::core::Prompt;
use crate::errors::PipelineError;
use crate::generation::TextGenerator;
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Instruction text for a stage, rendered around the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTemplate {
    intro: Cow<'static, str>,
}

impl InstructionTemplate {
    /// Creates a template with the given introduction.
    #[must_use]
    pub fn new(intro: impl Into<Cow<'static, str>>) -> Self {
        Self {
            intro: intro.into(),
        }
    }

    /// Template for the planning stage.
    #[must_use]
    pub const fn plan() -> Self {
        Self {
            intro: Cow::Borrowed(
                "You are planning a response. Write a short, numbered plan for how to answer the request below.",
            ),
        }
    }

    /// Template for the drafting stage.
    #[must_use]
    pub const fn act() -> Self {
        Self {
            intro: Cow::Borrowed(
                "Based on the plan above, write a complete draft that answers the request below.",
            ),
        }
    }

    /// Template for the review stage.
    #[must_use]
    pub const fn reflect() -> Self {
        Self {
            intro: Cow::Borrowed(
                "Read the draft, critique it briefly, then return an improved final answer to the request below.",
            ),
        }
    }

    /// Renders the instruction for a prompt, optionally embedding the previous stage's output.
    #[must_use]
    pub fn render(&self, prompt: &Prompt, previous: Option<PreviousOutput<'_>>) -> String {
        let mut instruction = format!("{}\n\nRequest:\n{}", self.intro, prompt);
        if let Some(previous) = previous {
            instruction.push_str(&format!(
                "\n\nOutput of the {} stage:\n{}",
                previous.stage, previous.output
            ));
        }
        instruction
    }
}

/// A stage that renders its instruction and calls the generation capability.
pub struct GenerationStage {
    name: String,
    template: InstructionTemplate,
    generator: Arc<dyn TextGenerator>,
}

impl GenerationStage {
    /// Creates a new generation stage.
    pub fn new(
        name: impl Into<String>,
        template: InstructionTemplate,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            generator,
        }
    }

    /// The `plan` stage.
    pub fn plan(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new("plan", InstructionTemplate::plan(), generator)
    }

    /// The `act` stage.
    pub fn act(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new("act", InstructionTemplate::act(), generator)
    }

    /// The `reflect` stage.
    pub fn reflect(generator: Arc<dyn TextGenerator>) -> Self {
        Self::new("reflect", InstructionTemplate::reflect(), generator)
    }

    /// Returns the stage's instruction template.
    #[must_use]
    pub fn template(&self) -> &InstructionTemplate {
        &self.template
    }
}

impl fmt::Debug for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationStage")
            .field("name", &self.name)
            .field("template", &self.template)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for GenerationStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StageContext<'_>) -> Result<String, PipelineError> {
        let instruction = self.template.render(ctx.prompt(), ctx.previous());
        debug!(
            stage = %self.name,
            run_id = %ctx.run_id(),
            instruction_chars = instruction.len(),
            "Invoking generation capability"
        );

        self.generator
            .generate(&instruction)
            .await
            .map_err(|e| PipelineError::stage(&self.name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GenerationError;
    use crate::generation::MockTextGenerator;

    #[test]
    fn test_render_embeds_prompt() {
        let prompt = Prompt::new("Write a haiku about autumn");
        let text = InstructionTemplate::plan().render(&prompt, None);

        assert!(text.starts_with("You are planning a response."));
        assert!(text.ends_with("Request:\nWrite a haiku about autumn"));
    }

    #[test]
    fn test_render_with_previous_output() {
        let prompt = Prompt::new("p");
        let text = InstructionTemplate::act().render(
            &prompt,
            Some(PreviousOutput {
                stage: "plan",
                output: "1. do it",
            }),
        );

        assert!(text.contains("Output of the plan stage:\n1. do it"));
    }

    #[test]
    fn test_canonical_stage_names() {
        let generator: Arc<dyn TextGenerator> = Arc::new(crate::generation::EchoGenerator::new());
        assert_eq!(GenerationStage::plan(generator.clone()).name(), "plan");
        assert_eq!(GenerationStage::act(generator.clone()).name(), "act");
        assert_eq!(GenerationStage::reflect(generator).name(), "reflect");
    }

    #[tokio::test]
    async fn test_execute_returns_generated_text() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(1)
            .returning(|instruction| {
                assert!(instruction.contains("Request:\nhello"));
                Ok("plan text".to_string())
            });

        let stage = GenerationStage::plan(Arc::new(generator));
        let prompt = Prompt::new("hello");
        let ctx = StageContext::new("run-1", "plan", &prompt);

        assert_eq!(stage.execute(&ctx).await.unwrap(), "plan text");
    }

    #[tokio::test]
    async fn test_execute_wraps_generation_failure() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(GenerationError::new("quota exceeded").with_name("HttpError")));

        let stage = GenerationStage::act(Arc::new(generator));
        let prompt = Prompt::new("hello");
        let ctx = StageContext::new("run-1", "act", &prompt);

        let err = stage.execute(&ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Stage 'act' failed: quota exceeded");
        assert_eq!(err.name(), "HttpError");
    }
}
