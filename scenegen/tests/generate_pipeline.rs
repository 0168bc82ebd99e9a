//! Pipeline-level tests for `SceneGenerator`.
//!
//! These tests drive a full run with scripted completion and renderer
//! collaborators to verify stage ordering, failure attribution and what is
//! left on disk after each kind of failure.

use std::fs;

use scenegen::core::types::Stage;
use scenegen::generate::{Progress, RenderFailure, RunError, SceneGenerator};
use scenegen::test_support::{
    ScriptedCompletion, ScriptedRenderer, ScriptedReply, TestWorkspace,
};

const NOISY_RESPONSE: [&str; 6] = [
    "Sure, here's the code:\n",
    "```python\n",
    "from manimlib import *\n\n",
    "class GeneratedScene(Scene):\n",
    "    def construct(self):\n        self.play(ShowCreation(Circle()))\n",
    "```",
];

const CLEAN_CODE: &str = "from manimlib import *\n\nclass GeneratedScene(Scene):\n    def construct(self):\n        self.play(ShowCreation(Circle()))";

/// Happy path: fragments are joined, cleaned, written, and the renderer sees the file.
#[test]
fn successful_run_writes_cleaned_code_and_renders() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(NOISY_RESPONSE),
        ScriptedRenderer::succeeding("File ready at media/videos/GeneratedScene.mp4\n"),
    );

    let outcome = generator.run("circles").expect("run");

    assert_eq!(outcome.code, CLEAN_CODE);
    assert_eq!(outcome.scene_path, ws.scene_path());
    assert!(outcome.render.success());
    assert!(outcome.render.stdout.contains("GeneratedScene.mp4"));
    assert_eq!(ws.read_scene().as_deref(), Some(CLEAN_CODE));

    let calls = generator.renderer().calls();
    assert_eq!(calls.len(), 1);
    let (request, scene_at_render) = &calls[0];
    assert_eq!(request.scene_path, ws.scene_path());
    assert_eq!(request.scene_name, "GeneratedScene");
    assert_eq!(scene_at_render.as_deref(), Some(CLEAN_CODE));
}

/// The completion request carries the topic inside the fixed template and the fixed parameters.
#[test]
fn completion_request_uses_template_and_configured_parameters() {
    let ws = TestWorkspace::new().expect("workspace");
    let mut config = ws.config();
    config.completion.model = "llama-3.1-8b-instant".to_string();
    config.completion.max_completion_tokens = 1024;
    let generator = SceneGenerator::new(
        config,
        ScriptedCompletion::fragments(["import os"]),
        ScriptedRenderer::succeeding(""),
    );

    generator.run("Bayes' theorem").expect("run");

    let requests = generator.client().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.model, "llama-3.1-8b-instant");
    assert_eq!(request.max_completion_tokens, 1024);
    assert_eq!(request.temperature, 1.0);
    assert_eq!(request.top_p, 1.0);
    assert!(request.stream);
    assert!(request.stop.is_none());
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, "user");
    assert!(request.messages[0].content.contains("\n\nBayes' theorem\n\n"));
    assert!(request.messages[0].content.contains("no markdown fences"));
}

/// Missing fragments contribute nothing to the raw response.
#[test]
fn empty_fragments_contribute_nothing() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::new(ScriptedReply::Fragments(vec![
            None,
            Some("import ".to_string()),
            None,
            Some(String::new()),
            Some("os".to_string()),
        ])),
        ScriptedRenderer::succeeding(""),
    );

    let outcome = generator.run("os module").expect("run");
    assert_eq!(outcome.code, "import os");
}

/// A failing completion call is a generation failure: no file, no render.
#[test]
fn completion_failure_reports_generation_error_without_writing() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::failing("completion API error (401): Invalid API Key"),
        ScriptedRenderer::succeeding(""),
    );

    let err = generator.run("topology").unwrap_err();

    assert_eq!(err.stage(), Stage::Generation);
    assert!(matches!(err, RunError::Generation(_)));
    assert!(err.to_string().contains("Invalid API Key"));
    assert!(!ws.scene_path().exists(), "no scene file may be written");
    assert_eq!(generator.renderer().call_count(), 0);
    assert_eq!(generator.client().requests().len(), 1, "no retry");
}

/// A stream that breaks halfway is still a generation failure; partial text is discarded.
#[test]
fn mid_stream_failure_discards_partial_response() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::new(ScriptedReply::FailMidStream {
            fragments: vec![Some("import os\n".to_string())],
            error: "connection reset".to_string(),
        }),
        ScriptedRenderer::succeeding(""),
    );

    let err = generator.run("graphs").unwrap_err();
    assert_eq!(err.stage(), Stage::Generation);
    assert!(err.to_string().contains("connection reset"));
    assert!(!ws.scene_path().exists());
    assert_eq!(generator.renderer().call_count(), 0);
}

/// An unwritable scene path is a persistence failure and the renderer is never invoked.
#[test]
fn write_failure_reports_persistence_error_and_skips_render() {
    let ws = TestWorkspace::new().expect("workspace");
    let mut config = ws.config();
    config.output.scene_path = ws.path().join("missing-dir").join("scene.py");
    let generator = SceneGenerator::new(
        config,
        ScriptedCompletion::fragments(["import os"]),
        ScriptedRenderer::succeeding(""),
    );

    let err = generator.run("topic").unwrap_err();

    assert_eq!(err.stage(), Stage::Persistence);
    match &err {
        RunError::Persistence { path, .. } => {
            assert_eq!(path, &ws.path().join("missing-dir").join("scene.py"));
        }
        other => panic!("expected persistence error, got {other:?}"),
    }
    assert_eq!(generator.renderer().call_count(), 0);
}

/// A renderer exiting with status 1 is a render failure carrying stderr; the file stays.
#[test]
fn render_exit_failure_keeps_file_and_reports_output() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(NOISY_RESPONSE),
        ScriptedRenderer::exiting(
            1,
            "Manim Community v0.18.0\n",
            "NameError: name 'ShowCreation' is not defined\n",
        ),
    );

    let err = generator.run("circles").unwrap_err();

    assert_eq!(err.stage(), Stage::Render);
    let result = err.render_result().expect("captured output");
    assert_eq!(result.exit_code, Some(1));
    assert_eq!(result.stdout, "Manim Community v0.18.0\n");
    assert_eq!(
        result.stderr,
        "NameError: name 'ShowCreation' is not defined\n"
    );
    assert_eq!(ws.read_scene().as_deref(), Some(CLEAN_CODE));
    assert_eq!(generator.renderer().call_count(), 1, "no retry");
}

/// A renderer that cannot start is still attributed to the render stage.
#[test]
fn renderer_launch_failure_is_a_render_error() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(["import os"]),
        ScriptedRenderer::unlaunchable("spawn \"manim\": No such file or directory"),
    );

    let err = generator.run("topic").unwrap_err();

    assert_eq!(err.stage(), Stage::Render);
    assert!(matches!(err, RunError::Render(RenderFailure::Launch(_))));
    assert!(err.render_result().is_none());
    assert!(ws.scene_path().exists());
}

/// Each run overwrites the scene file completely.
#[test]
fn second_run_overwrites_previous_scene() {
    let ws = TestWorkspace::new().expect("workspace");
    fs::write(ws.scene_path(), "stale content that is much longer than the new code\n")
        .expect("seed");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(["import math"]),
        ScriptedRenderer::succeeding(""),
    );

    generator.run("pi").expect("run");
    assert_eq!(ws.read_scene().as_deref(), Some("import math"));
}

/// Progress milestones are reported in pipeline order, and stop at the failing stage.
#[test]
fn progress_follows_pipeline_order() {
    let ws = TestWorkspace::new().expect("workspace");
    let generator = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(["import os"]),
        ScriptedRenderer::succeeding(""),
    );

    let mut seen = Vec::new();
    generator
        .run_with_progress("topic", |progress| {
            seen.push(match progress {
                Progress::Generating => "generating".to_string(),
                Progress::Generated { code } => format!("generated:{code}"),
                Progress::Written { .. } => "written".to_string(),
                Progress::Rendering => "rendering".to_string(),
                Progress::Rendered => "rendered".to_string(),
            });
        })
        .expect("run");
    assert_eq!(
        seen,
        vec![
            "generating",
            "generated:import os",
            "written",
            "rendering",
            "rendered"
        ]
    );

    let failing = SceneGenerator::new(
        ws.config(),
        ScriptedCompletion::fragments(["import os"]),
        ScriptedRenderer::exiting(2, "", "boom"),
    );
    let mut count = 0;
    let mut rendered = false;
    let err = failing
        .run_with_progress("topic", |progress| {
            count += 1;
            rendered |= matches!(progress, Progress::Rendered);
        })
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Render);
    assert_eq!(count, 4);
    assert!(!rendered);
}
