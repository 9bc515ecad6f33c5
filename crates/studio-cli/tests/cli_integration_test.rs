//! Integration tests for the CLI commands, using temporary files.

use clap::Parser;
use std::path::Path;
use studio_cli::commands::{self, prompt, render, run};
use studio_cli::{Cli, ExitCode, OutputArgs, OutputFormat, SessionArgs};
use studio_core::{ExecutionMode, StudioConfig};
use studio_vfs::{VfsBuilder, VfsSnapshot};
use tempfile::TempDir;

const SCRIPT: &str = r#"[
  {
    "prompt": "scaffold a button",
    "commands": [
      {"name": "create_file", "args": {
        "path": "/components/Button.jsx",
        "content": "export default function Button() { return <button>Go</button>; }"
      }},
      {"name": "create_file", "args": {
        "path": "/App.jsx",
        "content": "import Button from './components/Button';\nexport default () => <Button />;"
      }}
    ]
  },
  {
    "prompt": "relabel",
    "commands": [
      {"name": "edit_file", "args": {
        "path": "/components/Button.jsx",
        "oldFragment": ">Go<",
        "newFragment": ">Start<"
      }}
    ]
  }
]"#;

fn session_args(dir: &Path) -> SessionArgs {
    SessionArgs {
        from: None,
        output: OutputArgs {
            out: Some(dir.join("preview.html")),
            snapshot_out: Some(dir.join("project.json")),
        },
    }
}

fn read_snapshot(path: &Path) -> VfsSnapshot {
    VfsSnapshot::from_json(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_run_replays_script_and_writes_outputs() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("turns.json");
    std::fs::write(&script, SCRIPT).unwrap();

    let code = run::run(
        &script,
        StudioConfig::default(),
        &session_args(dir.path()),
        OutputFormat::Json,
    )
    .await
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let html = std::fs::read_to_string(dir.path().join("preview.html")).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"<script type="importmap">"#));

    let snapshot = read_snapshot(&dir.path().join("project.json"));
    assert!(
        snapshot
            .get("/components/Button.jsx")
            .unwrap()
            .content
            .contains(">Start<")
    );
}

#[tokio::test]
async fn test_malformed_script_is_reported() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("turns.json");
    std::fs::write(&script, r#"{"not": "a list"}"#).unwrap();

    let err = run::run(
        &script,
        StudioConfig::default(),
        &SessionArgs::default(),
        OutputFormat::Json,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("failed to parse turn script"));
}

#[tokio::test]
async fn test_prompt_snapshot_renders_again() {
    let dir = TempDir::new().unwrap();
    let config = StudioConfig::builder().mode(ExecutionMode::Constrained).build();
    let prompts = vec!["a counter".to_string(), "a profile card".to_string()];

    let args = session_args(dir.path());
    let code = prompt::run(&prompts, config.clone(), &args, OutputFormat::Pretty)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let snapshot = dir.path().join("project.json");
    assert!(read_snapshot(&snapshot).get("/styles/card.css").is_some());

    let rendered = dir.path().join("rendered.html");
    let code = render::run(
        &snapshot,
        config,
        &OutputArgs {
            out: Some(rendered.clone()),
            snapshot_out: None,
        },
        OutputFormat::Json,
    )
    .await
    .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(std::fs::read_to_string(rendered).unwrap().contains("data-path=\"/styles/card.css\""));
}

#[tokio::test]
async fn test_render_broken_snapshot_fails() {
    let dir = TempDir::new().unwrap();
    let vfs = VfsBuilder::new()
        .add_file("/App.jsx", "import Missing from './Missing';\nexport default () => <Missing />;")
        .build()
        .unwrap();
    let snapshot = dir.path().join("broken.json");
    std::fs::write(&snapshot, vfs.snapshot().to_json().unwrap()).unwrap();
    let out = dir.path().join("preview.html");

    let code = render::run(
        &snapshot,
        StudioConfig::default(),
        &OutputArgs {
            out: Some(out.clone()),
            snapshot_out: None,
        },
        OutputFormat::Pretty,
    )
    .await
    .unwrap();
    assert_eq!(code, ExitCode::RENDER_FAILED);
    assert!(!out.exists());
}

#[tokio::test]
async fn test_execute_with_explicit_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("studio.toml");
    std::fs::write(&config, "[executor]\nmode = \"constrained\"\n").unwrap();
    let snapshot = dir.path().join("project.json");

    let cli = Cli::parse_from([
        "studio",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
        "prompt",
        "a contact form",
        "--snapshot-out",
        snapshot.to_str().unwrap(),
    ]);
    let code = commands::execute(cli).await.unwrap();

    assert!(code.is_success());
    assert!(read_snapshot(&snapshot).get("/components/ContactForm.jsx").is_some());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("studio.toml");
    std::fs::write(&config, "[linker]\nentry = \"App.jsx\"\n").unwrap();

    let cli = Cli::parse_from([
        "studio",
        "--config",
        config.to_str().unwrap(),
        "render",
        "unused.json",
    ]);
    let err = commands::execute(cli).await.unwrap_err();
    assert!(err.to_string().contains("failed to load config"));
}
