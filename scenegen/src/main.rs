//! Topic-to-animation generator CLI.
//!
//! `scenegen generate` asks the configured chat model for Manim scene code,
//! writes the cleaned code to the scene file and renders it. Each failing
//! stage exits with its own code (see [`scenegen::exit_codes`]).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use scenegen::core::cleaner::clean_generated_code;
use scenegen::exit_codes;
use scenegen::generate::{Progress, RunError, SceneGenerator};
use scenegen::io::completion::HttpCompletionClient;
use scenegen::io::config::{DEFAULT_CONFIG_PATH, GeneratorConfig, load_config, write_config};
use scenegen::io::prompt::build_scene_prompt;
use scenegen::io::renderer::ManimRenderer;
use scenegen::logging;

const EMPTY_TOPIC_MESSAGE: &str = "Please enter a topic or description to explain.";

#[derive(Parser)]
#[command(
    name = "scenegen",
    version,
    about = "Generate 3Blue1Brown-style Manim scenes from a topic"
)]
struct Cli {
    /// Config file (TOML). Defaults apply when it does not exist.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate scene code for a topic, write it to the scene file and render it.
    Generate {
        /// Topic or concept to explain (words are joined with spaces).
        topic: Vec<String>,
        /// Read the topic from a file instead.
        #[arg(long, conflicts_with = "topic")]
        topic_file: Option<PathBuf>,
        /// Do not print the generated code.
        #[arg(long)]
        quiet_code: bool,
    },
    /// Strip fences and filler from a model answer (file or stdin) and print the code.
    Clean {
        /// File to clean; reads stdin when omitted.
        path: Option<PathBuf>,
    },
    /// Print the instruction that would be sent for a topic.
    Prompt {
        /// Topic or concept to explain.
        topic: Vec<String>,
    },
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage errors share the INVALID code; --help/--version are not errors.
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    logging::init();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let Cli { config, command } = cli;
    match command {
        Command::Generate {
            topic,
            topic_file,
            quiet_code,
        } => cmd_generate(&config, &topic, topic_file.as_deref(), quiet_code),
        Command::Clean { path } => cmd_clean(path.as_deref()),
        Command::Prompt { topic } => cmd_prompt(&topic),
        Command::Init { force } => cmd_init(&config, force),
    }
}

fn cmd_generate(
    config_path: &Path,
    topic: &[String],
    topic_file: Option<&Path>,
    quiet_code: bool,
) -> Result<i32> {
    let topic = match topic_file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        None => topic.join(" "),
    };
    if topic.trim().is_empty() {
        eprintln!("{EMPTY_TOPIC_MESSAGE}");
        return Ok(exit_codes::INVALID);
    }

    let cfg = load_config(config_path)?;
    let client = HttpCompletionClient::new(&cfg.completion)?;
    let renderer = ManimRenderer::new(&cfg.renderer);
    let generator = SceneGenerator::new(cfg, client, renderer);

    match generator.run_with_progress(&topic, |progress| report_progress(progress, quiet_code)) {
        Ok(outcome) => {
            println!("Video rendered successfully!");
            println!("Renderer output:\n{}", outcome.render.stdout);
            Ok(exit_codes::OK)
        }
        Err(err) => {
            report_failure(&err);
            Ok(exit_codes::for_stage(err.stage()))
        }
    }
}

fn report_progress(progress: &Progress<'_>, quiet_code: bool) {
    match progress {
        Progress::Generating => println!("Generating scene code..."),
        Progress::Generated { code } => {
            println!("Scene code generated successfully!");
            if !quiet_code {
                println!("--- generated scene code ---\n{code}\n--- end of scene code ---");
            }
        }
        Progress::Written { path } => {
            println!("Scene code written to {} successfully!", path.display());
        }
        Progress::Rendering => println!("Rendering video (this may take a moment)..."),
        Progress::Rendered => {}
    }
}

fn report_failure(err: &RunError) {
    eprintln!("{err}");
    if let Some(result) = err.render_result() {
        eprintln!("STDOUT:\n{}", result.stdout);
        eprintln!("STDERR:\n{}", result.stderr);
    }
}

fn cmd_clean(path: Option<&Path>) -> Result<i32> {
    let raw = match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            buf
        }
    };
    println!("{}", clean_generated_code(&raw));
    Ok(exit_codes::OK)
}

fn cmd_prompt(topic: &[String]) -> Result<i32> {
    let topic = topic.join(" ");
    if topic.trim().is_empty() {
        eprintln!("{EMPTY_TOPIC_MESSAGE}");
        return Ok(exit_codes::INVALID);
    }
    println!("{}", build_scene_prompt(&topic)?);
    Ok(exit_codes::OK)
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &GeneratorConfig::default())
        .with_context(|| format!("write {}", config_path.display()))?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}
