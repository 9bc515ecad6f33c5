//! Integration tests for command execution and turns.

use async_trait::async_trait;
use proptest::prelude::*;
use studio_core::{ErrorKind, ExecutionMode, ExecutorConfig, LinkerConfig, Result, StudioConfig};
use studio_linker::Linker;
use studio_tools::{
    CommandProvider, MockProvider, ScriptedProvider, ToolCommand, ToolExecutor, TurnContext,
    TurnDriver, TurnHalt,
};
use studio_vfs::{Vfs, VfsBuilder};
use tokio_util::sync::CancellationToken;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("studio_tools=debug")
        .with_test_writer()
        .try_init();
}

fn create(path: &str, content: &str) -> ToolCommand {
    ToolCommand::CreateFile {
        path: path.to_string(),
        content: content.to_string(),
    }
}

fn edit(path: &str, old: &str, new: &str) -> ToolCommand {
    ToolCommand::EditFile {
        path: path.to_string(),
        old_fragment: old.to_string(),
        new_fragment: new.to_string(),
    }
}

#[test]
fn test_ambiguous_edit_leaves_file_and_bundle_unchanged() {
    init_tracing();
    let source = "export default function App() {\n  return <div><p>Hi</p><p>Hi</p></div>;\n}\n";
    let mut vfs = VfsBuilder::new().add_file("/App.jsx", source).build().unwrap();
    let mut linker = Linker::new(&LinkerConfig::default(), 16).unwrap();
    let before = linker.link(&vfs);
    vfs.take_changes();

    let command = edit("/App.jsx", "<p>Hi</p>", "<p>Hello</p>");
    let response = ToolExecutor::default().execute(&mut vfs, &command);
    assert!(!response.ok);
    assert_eq!(response.error, Some(ErrorKind::AmbiguousEdit));
    assert!(response.message.contains("occurs 2 time(s)"));
    assert_eq!(vfs.read("/App.jsx").unwrap(), source);

    let changes = vfs.take_changes();
    assert!(changes.is_empty());
    assert_eq!(linker.rebuild(&vfs, &changes), before);
}

#[test]
fn test_unique_edit_replaces_only_that_occurrence() {
    let mut vfs = VfsBuilder::new()
        .add_file("/App.jsx", "const a = 'Hi';\nconst b = 'Hi there';")
        .build()
        .unwrap();
    let response = ToolExecutor::default().execute(&mut vfs, &edit("/App.jsx", "'Hi'", "'Hello'"));
    assert!(response.ok, "{}", response.message);
    assert_eq!(vfs.read("/App.jsx").unwrap(), "const a = 'Hello';\nconst b = 'Hi there';");
}

#[test]
fn test_directory_delete_cascades() {
    let mut vfs = VfsBuilder::new()
        .add_file("/components/Button.jsx", "")
        .add_file("/components/forms/Input.jsx", "")
        .add_file("/App.jsx", "")
        .build()
        .unwrap();
    let response = ToolExecutor::default().execute(
        &mut vfs,
        &ToolCommand::DeleteFile {
            path: "/components".to_string(),
        },
    );
    assert_eq!(response.message, "Deleted /components and 3 nested entries");
    assert_eq!(vfs.file_paths().len(), 1);
    assert!(!vfs.exists("/components/forms"));
}

#[test]
fn test_structural_failures_leave_vfs_unchanged() {
    let mut vfs = VfsBuilder::new()
        .add_file("/components/Button.jsx", "a")
        .add_file("/components/Card.jsx", "b")
        .build()
        .unwrap();
    let before = vfs.snapshot();
    let executor = ToolExecutor::default();

    let conflict = executor.execute(
        &mut vfs,
        &ToolCommand::RenameOrMove {
            from: "/components/Button.jsx".to_string(),
            to: "/components/Card.jsx".to_string(),
        },
    );
    assert_eq!(conflict.error, Some(ErrorKind::PathConflict));

    let cyclic = executor.execute(
        &mut vfs,
        &ToolCommand::RenameOrMove {
            from: "/components".to_string(),
            to: "/components/nested".to_string(),
        },
    );
    assert_eq!(cyclic.error, Some(ErrorKind::CyclicMove));

    let traversal = executor.execute(&mut vfs, &create("/components/../../etc/passwd", ""));
    assert_eq!(traversal.error, Some(ErrorKind::InvalidPath));

    assert_eq!(vfs.snapshot(), before);
}

#[tokio::test]
async fn test_step_limit_preserves_applied_commands() {
    init_tracing();
    let batch: Vec<_> = (0..6).map(|i| create(&format!("/f{i}.js"), "")).collect();
    let provider = ScriptedProvider::from_batches([batch]);
    let config = StudioConfig::builder().mode(ExecutionMode::Constrained).build();
    let driver = TurnDriver::from_config(&config);
    let mut vfs = Vfs::new();

    let report = driver
        .run(&provider, &mut vfs, 1, "six files", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.applied(), 4);
    assert_eq!(report.halted, Some(TurnHalt::StepLimit { limit: 4, dropped: 2 }));
    assert_eq!(
        report.halted.as_ref().unwrap().diagnostic().kind,
        ErrorKind::StepLimitExceeded
    );
    assert_eq!(vfs.file_count(), 4);
    assert!(vfs.exists("/f3.js"));
    assert!(!vfs.exists("/f4.js"));
}

/// Applies one batch, then cancels the turn while producing the next.
#[derive(Debug)]
struct CancelsMidTurn {
    token: CancellationToken,
}

#[async_trait]
impl CommandProvider for CancelsMidTurn {
    fn name(&self) -> &str {
        "cancels-mid-turn"
    }

    async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
        if context.round == 0 {
            return Ok(vec![create("/a.js", "a"), create("/b.js", "b")]);
        }
        self.token.cancel();
        Ok(vec![create("/c.js", "c"), create("/d.js", "d")])
    }
}

#[tokio::test]
async fn test_cancellation_keeps_last_applied_state() {
    let token = CancellationToken::new();
    let provider = CancelsMidTurn {
        token: token.clone(),
    };
    let driver = TurnDriver::new(&ExecutorConfig::default(), ToolExecutor::default());
    let mut vfs = Vfs::new();

    let report = driver.run(&provider, &mut vfs, 1, "", &token).await.unwrap();

    assert_eq!(report.applied(), 2);
    assert_eq!(report.halted, Some(TurnHalt::Cancelled { dropped: 2 }));
    assert_eq!(vfs.file_paths().len(), 2);
    assert!(!vfs.exists("/c.js"));
}

#[tokio::test]
async fn test_feedback_reaches_provider() {
    /// Retries a failed edit with a corrected fragment.
    #[derive(Debug)]
    struct Retrying;

    #[async_trait]
    impl CommandProvider for Retrying {
        fn name(&self) -> &str {
            "retrying"
        }

        async fn produce_next_commands(&self, context: &TurnContext) -> Result<Vec<ToolCommand>> {
            Ok(match context.round {
                0 => vec![edit("/App.jsx", "Hi", "Hello")],
                1 if context.feedback.iter().any(|r| r.error == Some(ErrorKind::AmbiguousEdit)) => {
                    vec![edit("/App.jsx", "<b>Hi</b>", "<b>Hello</b>")]
                }
                _ => Vec::new(),
            })
        }
    }

    let mut vfs = VfsBuilder::new()
        .add_file("/App.jsx", "<i>Hi</i><b>Hi</b>")
        .build()
        .unwrap();
    let driver = TurnDriver::new(&ExecutorConfig::default(), ToolExecutor::default());
    let report = driver
        .run(&Retrying, &mut vfs, 1, "", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!((report.applied(), report.failed()), (1, 1));
    assert_eq!(vfs.read("/App.jsx").unwrap(), "<i>Hi</i><b>Hello</b>");
}

#[tokio::test]
async fn test_mock_provider_turns_link() {
    let config = StudioConfig::builder().mode(ExecutionMode::Constrained).build();
    let driver = TurnDriver::from_config(&config);
    let provider = MockProvider::new();
    let mut vfs = Vfs::new();
    let cancel = CancellationToken::new();

    for (turn, prompt) in [(1, "a counter"), (2, "and a profile card")] {
        let report = driver.run(&provider, &mut vfs, turn, prompt, &cancel).await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.failed(), 0, "{report:?}");
    }

    let bundle = Linker::new(&config.linker, 16).unwrap().link(&vfs);
    assert!(!bundle.has_errors());
    let order: Vec<_> = bundle.load_order().into_iter().map(|p| p.as_str()).collect();
    assert_eq!(
        order,
        vec!["/components/Counter.jsx", "/components/ProfileCard.jsx", "/App.jsx"]
    );
    assert_eq!(bundle.styles.len(), 1);
}

#[test]
fn test_json_batch_round_trip_through_executor() {
    let commands = ToolCommand::parse_batch(
        r#"[
            {"name": "create_directory", "args": {"path": "/components"}},
            {"name": "create_file", "args": {
                "path": "/components/Tag.jsx",
                "content": "export default () => <span />;"
            }},
            {"name": "insert_text", "args": {
                "path": "/components/Tag.jsx",
                "line": 0,
                "text": "// tag"
            }},
            {"name": "view_file", "args": {"path": "/components/Tag.jsx"}}
        ]"#,
    )
    .unwrap();
    let executor = ToolExecutor::default();
    let mut vfs = Vfs::new();
    let responses: Vec<_> = commands.iter().map(|c| executor.execute(&mut vfs, c)).collect();

    assert!(responses.iter().all(|r| r.ok));
    assert_eq!(
        responses[3].message,
        "    1\t// tag\n    2\texport default () => <span />;"
    );
}

proptest! {
    #[test]
    fn prop_edit_replaces_exactly_one_site(
        prefix in "[a-z \n]{0,40}",
        suffix in "[a-z \n]{0,40}",
        replacement in "[a-zA-Z]{0,10}",
    ) {
        let original = format!("{prefix}@@MARK@@{suffix}");
        let mut vfs = VfsBuilder::new().add_file("/f.js", original.as_str()).build().unwrap();
        let command = edit("/f.js", "@@MARK@@", &replacement);
        let response = ToolExecutor::default().execute(&mut vfs, &command);
        prop_assert!(response.ok);
        prop_assert_eq!(vfs.read("/f.js").unwrap(), format!("{prefix}{replacement}{suffix}"));
    }

    #[test]
    fn prop_duplicate_fragment_never_mutates(
        middle in "[a-z]{0,20}",
    ) {
        let original = format!("@@MARK@@{middle}@@MARK@@");
        let mut vfs = VfsBuilder::new().add_file("/f.js", original.as_str()).build().unwrap();
        let response = ToolExecutor::default().execute(&mut vfs, &edit("/f.js", "@@MARK@@", "x"));
        prop_assert_eq!(response.error, Some(ErrorKind::AmbiguousEdit));
        prop_assert_eq!(vfs.read("/f.js").unwrap(), original.as_str());
    }
}
