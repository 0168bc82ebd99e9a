//! Generator configuration stored in `scenegen.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "scenegen.toml";

/// Generator configuration (TOML).
///
/// Every table is optional; missing fields fall back to the values the tool
/// has always used (Groq, `llama-3.3-70b-versatile`, `manim -pql`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    pub completion: CompletionConfig,
    pub output: OutputConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    /// Chat-completions endpoint (OpenAI-compatible).
    pub api_url: String,

    /// Environment variable holding the bearer token.
    pub api_key_env: String,

    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_completion_tokens: u32,

    /// Read timeout for the streamed response. Unset means wait indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 1.0,
            top_p: 1.0,
            max_completion_tokens: 32_768,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputConfig {
    /// File the cleaned scene code is written to. Overwritten on every run.
    pub scene_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            scene_path: PathBuf::from("generated_scene.py"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RendererConfig {
    pub program: String,
    /// Quality/preview flag passed first (`-pql` = preview, low quality).
    pub quality_flag: String,
    /// Scene class the generated code is expected to define.
    pub scene_name: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "manim".to_string(),
            quality_flag: "-pql".to_string(),
            scene_name: "GeneratedScene".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        let completion = &self.completion;
        if completion.api_url.trim().is_empty() {
            return Err(anyhow!("completion.api_url must be non-empty"));
        }
        if completion.api_key_env.trim().is_empty() {
            return Err(anyhow!("completion.api_key_env must be non-empty"));
        }
        if completion.model.trim().is_empty() {
            return Err(anyhow!("completion.model must be non-empty"));
        }
        if !(0.0..=2.0).contains(&completion.temperature) {
            return Err(anyhow!("completion.temperature must be within 0..=2"));
        }
        if !(completion.top_p > 0.0 && completion.top_p <= 1.0) {
            return Err(anyhow!("completion.top_p must be within (0, 1]"));
        }
        if completion.max_completion_tokens == 0 {
            return Err(anyhow!("completion.max_completion_tokens must be > 0"));
        }
        if completion.request_timeout_secs == Some(0) {
            return Err(anyhow!("completion.request_timeout_secs must be > 0 when set"));
        }
        if self.output.scene_path.as_os_str().is_empty() {
            return Err(anyhow!("output.scene_path must be non-empty"));
        }
        if self.renderer.program.trim().is_empty() {
            return Err(anyhow!("renderer.program must be non-empty"));
        }
        if self.renderer.scene_name.trim().is_empty() {
            return Err(anyhow!("renderer.scene_name must be non-empty"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GeneratorConfig::default()`.
pub fn load_config(path: &Path) -> Result<GeneratorConfig> {
    if !path.exists() {
        let cfg = GeneratorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GeneratorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GeneratorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
