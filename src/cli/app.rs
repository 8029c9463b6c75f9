use super::commands::{CommandContext, ConfigAction, HistoryAction};
use crate::clipboard::ClipboardAdapter;
use crate::config::Config;
use crate::error::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Clipboard history with pinning, kept on disk between runs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Custom data directory path
    #[arg(long, global = true, env = "CLIPSTASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep at most this many unpinned entries
    #[arg(long, global = true)]
    pub max_items: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    History(HistoryAction),

    /// Manage configuration settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Streams a command reads from and writes to
pub struct Terminal<'a> {
    pub input: &'a mut dyn BufRead,
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
    pub color: bool,
}

impl Cli {
    /// Execute the CLI command against the process's stdio
    pub async fn execute(self) -> Result<()> {
        // Load configuration from file, then merge with CLI args
        let config = match &self.data_dir {
            Some(dir) => Config::load_from_file(Config::path_in(dir)),
            None => Config::load_default(),
        }
        .unwrap_or_else(|e| {
            warn!("Using default configuration: {}", e);
            Config::default()
        })
        .merge_with_cli_args(&self);
        config.validate()?;

        // Prefer CLI arg, then config, then default
        let data_dir: PathBuf = match config.data_dir.clone() {
            Some(dir) => {
                if !dir.exists() {
                    std::fs::create_dir_all(&dir)?;
                }
                dir
            }
            None => crate::cli::ensure_data_dir()?,
        };

        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        let color = !config.quiet && stdout.is_terminal();
        let mut input = stdin.lock();
        let mut out = stdout.lock();
        let mut err = std::io::stderr();

        let mut terminal = Terminal {
            input: &mut input,
            out: &mut out,
            err: &mut err,
            color,
        };
        self.run(&data_dir, config, system_clipboard(), &mut terminal)
            .await
    }

    /// Execute the CLI command with the given collaborators
    pub async fn run(
        self,
        data_dir: &Path,
        config: Config,
        clipboard: Arc<dyn ClipboardAdapter>,
        terminal: &mut Terminal<'_>,
    ) -> Result<()> {
        match self.command {
            Commands::History(action) => {
                let quiet = config.quiet;
                let mut ctx = CommandContext::open(data_dir, config, clipboard)
                    .await?
                    .with_color(terminal.color);

                let result = action
                    .execute(&mut ctx, &mut *terminal.input, &mut *terminal.out)
                    .await;
                if !quiet {
                    ctx.flush_notifications(&mut *terminal.out)?;
                }
                ctx.report_advisory(&mut *terminal.err)?;
                result
            }
            Commands::Config { action } => action.execute(data_dir, &config, &mut *terminal.out),
            Commands::Completion { shell } => {
                generate_completion(shell, &mut *terminal.out);
                Ok(())
            }
        }
    }
}

#[cfg(feature = "system-clipboard")]
fn system_clipboard() -> Arc<dyn ClipboardAdapter> {
    Arc::new(crate::clipboard::SystemClipboard::new())
}

#[cfg(not(feature = "system-clipboard"))]
fn system_clipboard() -> Arc<dyn ClipboardAdapter> {
    warn!("Built without system-clipboard; copy and capture use a process-local clipboard");
    Arc::new(crate::clipboard::MemoryClipboard::new())
}

/// Generate shell completion script
fn generate_completion(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
}
