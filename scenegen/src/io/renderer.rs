//! Renderer abstraction for turning a scene file into video.
//!
//! The [`Renderer`] trait decouples the orchestrator from the actual rendering
//! tool (currently `manim`). Tests use scripted renderers that return
//! predetermined results without spawning processes.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::core::types::RenderResult;
use crate::io::config::RendererConfig;
use crate::io::process::run_command_capture;

/// Parameters for one renderer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Scene file written by the generator.
    pub scene_path: PathBuf,
    /// Scene class to render.
    pub scene_name: String,
}

/// Abstraction over rendering backends.
pub trait Renderer {
    /// Run the renderer to completion.
    ///
    /// A non-zero exit is reported through [`RenderResult`], not as `Err`;
    /// `Err` means the renderer could not be run at all.
    fn render(&self, request: &RenderRequest) -> Result<RenderResult>;
}

/// Renderer that spawns `manim <quality_flag> <scene_path> <scene_name>`.
#[derive(Debug, Clone)]
pub struct ManimRenderer {
    program: String,
    quality_flag: String,
}

impl ManimRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            program: config.program.clone(),
            quality_flag: config.quality_flag.clone(),
        }
    }

    fn command(&self, request: &RenderRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.quality_flag)
            .arg(&request.scene_path)
            .arg(&request.scene_name);
        cmd
    }
}

impl Renderer for ManimRenderer {
    #[instrument(skip_all, fields(program = %self.program, scene = %request.scene_name))]
    fn render(&self, request: &RenderRequest) -> Result<RenderResult> {
        info!(scene_path = %request.scene_path.display(), "starting renderer");
        let output = run_command_capture(self.command(request))
            .with_context(|| format!("run {}", self.program))?;

        let result = RenderResult {
            exit_code: output.status.code(),
            stdout: output.stdout_lossy(),
            stderr: output.stderr_lossy(),
        };
        if !result.success() {
            info!(exit_code = ?result.exit_code, "renderer failed");
        }
        Ok(result)
    }
}
