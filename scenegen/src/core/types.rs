//! Shared deterministic types for the generation pipeline.
//!
//! These types define stable contracts between the orchestrator and the
//! reporting layer. They do not depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stage that touches the outside world.
///
/// A failed run is attributed to exactly one stage so the user can tell
/// whether the model, the filesystem or the renderer was at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Completion call against the hosted model.
    Generation,
    /// Writing the cleaned code to the scene file.
    Persistence,
    /// Running the external renderer.
    Render,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Generation => "generation",
            Stage::Persistence => "persistence",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured outcome of one renderer invocation.
///
/// Output streams are kept verbatim (lossy UTF-8) so they can be shown to
/// the user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResult {
    /// Process exit code; `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RenderResult {
    /// True only for a clean zero exit.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
