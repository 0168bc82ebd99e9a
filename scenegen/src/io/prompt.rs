//! Instruction builder for the completion request.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::debug;

const SCENE_TEMPLATE: &str = include_str!("prompts/scene.md");

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("scene", SCENE_TEMPLATE)
            .context("load scene template")?;
        Ok(Self { env })
    }

    /// Render the fixed scene instruction around `topic`.
    ///
    /// The topic is embedded verbatim; callers are expected to have rejected
    /// blank topics already.
    pub fn render_scene(&self, topic: &str) -> Result<String> {
        let template = self.env.get_template("scene")?;
        let rendered = template
            .render(context! { topic => topic })
            .context("render scene template")?;
        debug!(topic_bytes = topic.len(), prompt_bytes = rendered.len(), "rendered prompt");
        Ok(rendered)
    }
}

/// Render the scene instruction with a fresh engine.
pub fn build_scene_prompt(topic: &str) -> Result<String> {
    PromptEngine::new()?.render_scene(topic)
}
