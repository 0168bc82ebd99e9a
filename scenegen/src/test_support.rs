//! Test-only collaborators for driving [`SceneGenerator`](crate::generate::SceneGenerator)
//! without network access or a real renderer.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::core::types::RenderResult;
use crate::io::completion::{CompletionClient, CompletionRequest, FragmentStream};
use crate::io::config::GeneratorConfig;
use crate::io::renderer::{RenderRequest, Renderer};

/// Scripted behavior of a [`ScriptedCompletion`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Deliver these fragments, then end the stream.
    Fragments(Vec<Option<String>>),
    /// Fail before any fragment is delivered (auth, network, quota).
    Fail(String),
    /// Deliver some fragments, then fail.
    FailMidStream {
        fragments: Vec<Option<String>>,
        error: String,
    },
}

/// Completion client that replays a scripted reply and records requests.
pub struct ScriptedCompletion {
    reply: ScriptedReply,
    requests: RefCell<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(reply: ScriptedReply) -> Self {
        Self {
            reply,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Deliver each text as one fragment.
    pub fn fragments<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ScriptedReply::Fragments(
            texts.into_iter().map(|text| Some(text.into())).collect(),
        ))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(ScriptedReply::Fail(message.to_string()))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream<'_>> {
        self.requests.borrow_mut().push(request.clone());
        match &self.reply {
            ScriptedReply::Fragments(fragments) => Ok(Box::new(
                fragments.clone().into_iter().map(Ok::<_, anyhow::Error>),
            )),
            ScriptedReply::Fail(message) => Err(anyhow!(message.clone())),
            ScriptedReply::FailMidStream { fragments, error } => {
                let error = error.clone();
                Ok(Box::new(
                    fragments
                        .clone()
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once_with(move || Err(anyhow!(error)))),
                ))
            }
        }
    }
}

/// Scripted behavior of a [`ScriptedRenderer`].
#[derive(Debug, Clone)]
pub enum ScriptedRender {
    /// Exit with the given code and output.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Fail to start at all.
    LaunchError(String),
}

/// Renderer that replays a scripted result.
///
/// Records each request together with the scene file contents as they were on
/// disk at the time the renderer was invoked.
pub struct ScriptedRenderer {
    script: ScriptedRender,
    calls: RefCell<Vec<(RenderRequest, Option<String>)>>,
}

impl ScriptedRenderer {
    pub fn new(script: ScriptedRender) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn succeeding(stdout: &str) -> Self {
        Self::exiting(0, stdout, "")
    }

    pub fn exiting(code: i32, stdout: &str, stderr: &str) -> Self {
        Self::new(ScriptedRender::Exit {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }

    pub fn unlaunchable(message: &str) -> Self {
        Self::new(ScriptedRender::LaunchError(message.to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Requests received so far, with the scene file contents seen by each.
    pub fn calls(&self) -> Vec<(RenderRequest, Option<String>)> {
        self.calls.borrow().clone()
    }
}

impl Renderer for ScriptedRenderer {
    fn render(&self, request: &RenderRequest) -> Result<RenderResult> {
        let scene = fs::read_to_string(&request.scene_path).ok();
        self.calls.borrow_mut().push((request.clone(), scene));
        match &self.script {
            ScriptedRender::Exit {
                code,
                stdout,
                stderr,
            } => Ok(RenderResult {
                exit_code: Some(*code),
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            }),
            ScriptedRender::LaunchError(message) => Err(anyhow!(message.clone())),
        }
    }
}

/// Scratch directory with a generator config pointing into it.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn scene_path(&self) -> PathBuf {
        self.dir.path().join("generated_scene.py")
    }

    /// Default config with the scene file placed inside the workspace.
    pub fn config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.output.scene_path = self.scene_path();
        config
    }

    pub fn read_scene(&self) -> Option<String> {
        fs::read_to_string(self.scene_path()).ok()
    }
}
