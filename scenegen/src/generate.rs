//! Orchestration for one `scenegen generate` run.
//!
//! The pipeline is strictly linear: build prompt, stream the completion,
//! clean it, write the scene file, render. The first failing stage ends the
//! run; nothing is retried and nothing already written is removed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::core::cleaner::clean_generated_code;
use crate::core::types::{RenderResult, Stage};
use crate::io::completion::{CompletionClient, CompletionRequest, collect_fragments};
use crate::io::config::GeneratorConfig;
use crate::io::prompt::build_scene_prompt;
use crate::io::renderer::{RenderRequest, Renderer};

/// Why the renderer stage failed.
#[derive(Debug, Error)]
pub enum RenderFailure {
    /// The renderer ran and exited unsuccessfully. Output is kept verbatim.
    #[error("renderer exited with status {}", exit_label(.result.exit_code))]
    Exited { result: RenderResult },
    /// The renderer could not be started (not installed, not executable, ...).
    #[error("could not run renderer: {0:#}")]
    Launch(anyhow::Error),
}

/// Terminal failure of a generation run, attributed to one stage.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("error generating scene code: {0:#}")]
    Generation(anyhow::Error),
    #[error("error writing the scene file {}: {source}", .path.display())]
    Persistence { path: PathBuf, source: io::Error },
    #[error("error during video rendering: {0}")]
    Render(RenderFailure),
}

impl RunError {
    pub fn stage(&self) -> Stage {
        match self {
            RunError::Generation(_) => Stage::Generation,
            RunError::Persistence { .. } => Stage::Persistence,
            RunError::Render(_) => Stage::Render,
        }
    }

    /// Captured renderer output, when the renderer ran and failed.
    pub fn render_result(&self) -> Option<&RenderResult> {
        match self {
            RunError::Render(RenderFailure::Exited { result }) => Some(result),
            _ => None,
        }
    }
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

/// Milestones reported while a run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'a> {
    /// Completion request is about to be sent.
    Generating,
    /// Completion finished and was cleaned.
    Generated { code: &'a str },
    /// Scene file written.
    Written { path: &'a Path },
    /// Renderer is about to start.
    Rendering,
    /// Renderer exited successfully.
    Rendered,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Cleaned code, exactly as written to the scene file.
    pub code: String,
    pub scene_path: PathBuf,
    pub render: RenderResult,
}

/// Drives the generate -> clean -> write -> render pipeline.
pub struct SceneGenerator<C, R> {
    config: GeneratorConfig,
    client: C,
    renderer: R,
}

impl<C: CompletionClient, R: Renderer> SceneGenerator<C, R> {
    pub fn new(config: GeneratorConfig, client: C, renderer: R) -> Self {
        Self {
            config,
            client,
            renderer,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Run the full pipeline for `topic`.
    pub fn run(&self, topic: &str) -> Result<GenerationOutcome, RunError> {
        self.run_with_progress(topic, |_| {})
    }

    /// Run the full pipeline, reporting each milestone to `on_progress`.
    #[instrument(skip_all, fields(topic_bytes = topic.len(), model = %self.config.completion.model))]
    pub fn run_with_progress<F: FnMut(&Progress<'_>)>(
        &self,
        topic: &str,
        mut on_progress: F,
    ) -> Result<GenerationOutcome, RunError> {
        on_progress(&Progress::Generating);
        let raw = self.generate_raw(topic).map_err(|err| {
            info!(err = %format!("{err:#}"), "generation failed");
            RunError::Generation(err)
        })?;
        let code = clean_generated_code(&raw);
        info!(
            raw_bytes = raw.len(),
            code_bytes = code.len(),
            "scene code generated"
        );
        on_progress(&Progress::Generated { code: &code });

        let scene_path = self.config.output.scene_path.clone();
        if let Err(source) = fs::write(&scene_path, &code) {
            info!(path = %scene_path.display(), err = %source, "scene write failed");
            return Err(RunError::Persistence {
                path: scene_path,
                source,
            });
        }
        debug!(path = %scene_path.display(), "scene file written");
        on_progress(&Progress::Written { path: &scene_path });

        on_progress(&Progress::Rendering);
        let request = RenderRequest {
            scene_path: scene_path.clone(),
            scene_name: self.config.renderer.scene_name.clone(),
        };
        let render = self
            .renderer
            .render(&request)
            .map_err(|err| RunError::Render(RenderFailure::Launch(err)))?;
        if !render.success() {
            return Err(RunError::Render(RenderFailure::Exited { result: render }));
        }
        on_progress(&Progress::Rendered);

        Ok(GenerationOutcome {
            code,
            scene_path,
            render,
        })
    }

    /// Build the prompt and drain the completion stream into one string.
    fn generate_raw(&self, topic: &str) -> Result<String> {
        let prompt = build_scene_prompt(topic)?;
        let request = CompletionRequest::from_prompt(&self.config.completion, prompt);
        let fragments = self.client.stream(&request)?;
        collect_fragments(fragments)
    }
}
