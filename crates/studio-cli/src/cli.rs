//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use studio_core::ExecutionMode;

/// Component Studio: build React components from tool commands and preview
/// them in a sandbox.
#[derive(Parser, Debug)]
#[command(name = "studio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging (debug level for studio crates)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Log line format (logs go to stderr)
    #[arg(long = "log-format", global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Configuration file (default: <config dir>/component-studio/studio.toml)
    #[arg(long, global = true, env = "STUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Execution mode, overriding the configuration file
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ExecutionMode>,

    /// Per-turn command ceiling, overriding the mode default
    #[arg(long = "max-steps", global = true)]
    pub max_steps: Option<usize>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded turn script.
    ///
    /// The script is a JSON array of `{"prompt": ..., "commands": [...]}`
    /// objects; each entry becomes one turn.
    Run {
        /// Turn script (JSON)
        script: PathBuf,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Scaffold components from prompts with the offline provider.
    ///
    /// Each prompt is one turn.
    Prompt {
        /// Prompts, one turn each
        #[arg(required = true)]
        prompts: Vec<String>,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Render a saved project snapshot.
    Render {
        /// Project snapshot (JSON)
        snapshot: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Options shared by commands that run turns.
#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Start from a project snapshot instead of an empty project
    #[arg(long)]
    pub from: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Where to write results besides stdout.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Write the rendered preview document to this file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write the final project snapshot to this file
    #[arg(long = "snapshot-out")]
    pub snapshot_out: Option<PathBuf>,
}

/// Report format on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON for machine parsing
    Json,
    /// Colored summary for humans
    #[default]
    Pretty,
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Everything rendered.
    pub const SUCCESS: Self = Self(0);

    /// The final render failed or nothing could be rendered.
    pub const RENDER_FAILED: Self = Self(1);

    /// Returns the raw code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns `true` for [`ExitCode::SUCCESS`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}
