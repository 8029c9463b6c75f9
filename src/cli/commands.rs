//! Subcommand implementations
//!
//! Every command runs against a [`CommandContext`] holding the loaded
//! history store, the clipboard and the notification channel, and writes
//! its output to the writer it is given.

use super::render::{render_entries, RenderOptions};
use crate::clipboard::{ClipboardAdapter, ClipboardWatcher};
use crate::config::Config;
use crate::error::{ClipError, Result};
use crate::history::store::FileSnapshotStore;
use crate::history::{AddOutcome, Entry, HistoryStore};
use crate::output::{ChannelNotifier, Notification, NotificationSink, TracingNotifier};
use chrono::Utc;
use clap::{Args, Subcommand};
use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Everything a history command needs
pub struct CommandContext {
    pub store: HistoryStore,
    pub clipboard: Arc<dyn ClipboardAdapter>,
    pub config: Config,
    pub color: bool,
    notifier: ChannelNotifier,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl CommandContext {
    /// Load the history kept in `data_dir`
    pub async fn open(
        data_dir: &Path,
        config: Config,
        clipboard: Arc<dyn ClipboardAdapter>,
    ) -> Result<Self> {
        let (notifier, notifications) = ChannelNotifier::new();
        let persistence = Arc::new(FileSnapshotStore::new(data_dir));
        let store = HistoryStore::new(config.history_config()?, persistence)
            .with_notifier(Arc::new(notifier.clone()));

        let mut context = Self {
            store,
            clipboard,
            config,
            color: false,
            notifier,
            notifications,
        };
        context.store.load().await?;
        Ok(context)
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Write pending notifications to `out`
    pub fn flush_notifications(&mut self, out: &mut dyn Write) -> Result<()> {
        while let Ok(notification) = self.notifications.try_recv() {
            writeln!(out, "{}", notification)?;
        }
        Ok(())
    }

    /// Write the store's advisory, if any, to `err`
    pub fn report_advisory(&self, err: &mut dyn Write) -> Result<()> {
        if let Some(advisory) = self.store.last_error() {
            writeln!(err, "warning: {}", advisory)?;
        }
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<Entry> {
        self.store
            .resolve(reference)
            .cloned()
            .ok_or_else(|| ClipError::entry_not_found(reference))
    }

    fn render(&self, rows: &[(usize, &Entry)]) -> String {
        render_entries(
            rows,
            RenderOptions {
                color: self.color,
                now_millis: Utc::now().timestamp_millis(),
            },
        )
    }
}

/// Commands that operate on the history
#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Add text to the history (reads stdin when TEXT is omitted)
    Add(AddCommand),

    /// Add the current clipboard text to the history
    Capture,

    /// Show the history, pinned entries first
    List(ListCommand),

    /// Find entries containing a string (case-insensitive)
    Search(SearchCommand),

    /// Put an entry back on the clipboard
    Copy(EntryRef),

    /// Remove an entry
    Delete(EntryRef),

    /// Pin or unpin an entry
    Pin(EntryRef),

    /// Remove every unpinned entry
    Clear(ClearCommand),

    /// Record clipboard changes until interrupted
    Watch(WatchCommand),
}

#[derive(Args, Debug)]
pub struct AddCommand {
    /// Text to add
    pub text: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListCommand {
    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the entries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Text to look for
    pub query: String,

    /// Show at most this many matches
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EntryRef {
    /// Position in `list` output or an id prefix
    pub reference: String,
}

#[derive(Args, Debug)]
pub struct ClearCommand {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct WatchCommand {
    /// Poll interval in milliseconds (defaults to the configured one)
    #[arg(long)]
    pub interval: Option<u64>,
}

impl HistoryAction {
    /// Run the command; `input` supplies stdin text and confirmations
    pub async fn execute(
        self,
        ctx: &mut CommandContext,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> Result<()> {
        match self {
            Self::Add(cmd) => cmd.execute(ctx, input, out).await,
            Self::Capture => capture(ctx, out).await,
            Self::List(cmd) => cmd.execute(ctx, out),
            Self::Search(cmd) => cmd.execute(ctx, out),
            Self::Copy(entry) => copy(ctx, &entry.reference).await,
            Self::Delete(entry) => {
                let target = ctx.resolve(&entry.reference)?;
                ctx.store.delete_entry(&target.id).await?;
                Ok(())
            }
            Self::Pin(entry) => {
                let target = ctx.resolve(&entry.reference)?;
                ctx.store.toggle_pin_entry(&target.id).await?;
                Ok(())
            }
            Self::Clear(cmd) => cmd.execute(ctx, input, out).await,
            Self::Watch(cmd) => cmd.execute(ctx, out).await,
        }
    }
}

impl AddCommand {
    async fn execute(
        self,
        ctx: &mut CommandContext,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> Result<()> {
        let text = match self.text {
            Some(text) => text,
            None => {
                let mut text = String::new();
                input.read_to_string(&mut text)?;
                strip_trailing_newline(text)
            }
        };

        let outcome = ctx.store.add_entry(&text).await?;
        write_outcome(&outcome, out)
    }
}

impl ListCommand {
    fn execute(self, ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
        let limit = self.limit.unwrap_or(usize::MAX);
        let entries: Vec<&Entry> = ctx.store.entries().iter().take(limit).collect();

        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
            return Ok(());
        }
        if entries.is_empty() {
            writeln!(out, "History is empty.")?;
            return Ok(());
        }

        let rows: Vec<_> = entries.into_iter().enumerate().map(|(i, e)| (i + 1, e)).collect();
        write!(out, "{}", ctx.render(&rows))?;
        Ok(())
    }
}

impl SearchCommand {
    fn execute(self, ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
        let mut rows = ctx.store.search(&self.query);
        rows.truncate(self.limit.unwrap_or(usize::MAX));

        if rows.is_empty() {
            writeln!(out, "No entries match '{}'.", self.query)?;
            return Ok(());
        }
        write!(out, "{}", ctx.render(&rows))?;
        Ok(())
    }
}

impl ClearCommand {
    async fn execute(
        self,
        ctx: &mut CommandContext,
        input: &mut dyn BufRead,
        out: &mut dyn Write,
    ) -> Result<()> {
        let unpinned = ctx.store.unpinned_count();
        if !self.yes && unpinned > 0 {
            let prompt = format!("Remove {} unpinned entries?", unpinned);
            if !confirm(&prompt, input, out)? {
                writeln!(out, "Aborted.")?;
                return Ok(());
            }
        }

        let removed = ctx.store.clear_history().await?;
        debug!(removed, "Cleared history");
        Ok(())
    }
}

impl WatchCommand {
    async fn execute(self, ctx: &mut CommandContext, out: &mut dyn Write) -> Result<()> {
        let interval = match self.interval {
            Some(0) => return Err(ClipError::invalid_input("interval must be positive")),
            Some(ms) => Duration::from_millis(ms),
            None => ctx.config.poll_interval(),
        };

        writeln!(out, "Watching clipboard every {:?}, press Ctrl-C to stop.", interval)?;
        out.flush()?;

        let mut watcher =
            ClipboardWatcher::new(ctx.clipboard.clone()).with_notifier(Arc::new(TracingNotifier));
        let shutdown = async {
            // A failed signal handler just means we run until killed
            let _ = tokio::signal::ctrl_c().await;
        };
        let captured = watcher.run(&mut ctx.store, interval, shutdown).await?;

        writeln!(out, "Captured {} clipboard change(s).", captured)?;
        Ok(())
    }
}

async fn capture(ctx: &mut CommandContext, out: &mut dyn Write) -> Result<()> {
    let text = ctx.clipboard.read_text().await?;
    let outcome = ctx.store.add_entry(&text).await?;
    if outcome != AddOutcome::Rejected {
        ctx.notify(Notification::Captured);
    }
    write_outcome(&outcome, out)
}

async fn copy(ctx: &mut CommandContext, reference: &str) -> Result<()> {
    let target = ctx.resolve(reference)?;
    ctx.clipboard.write_text(&target.text).await?;
    ctx.notify(Notification::Copied);
    Ok(())
}

/// Commands that inspect or create the configuration file
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print where the configuration file lives
    Path,

    /// Write a default configuration file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigAction {
    pub fn execute(self, data_dir: &Path, config: &Config, out: &mut dyn Write) -> Result<()> {
        let path = Config::path_in(data_dir);
        match self {
            Self::Show => {
                let content = toml::to_string_pretty(config).map_err(|e| {
                    ClipError::configuration(format!("Failed to serialize config: {}", e))
                })?;
                write!(out, "{}", content)?;
            }
            Self::Path => writeln!(out, "{}", path.display())?,
            Self::Init { force } => {
                if path.exists() && !force {
                    return Err(ClipError::invalid_input(format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    )));
                }
                Config::default().save_to_file(&path)?;
                writeln!(out, "Wrote {}", path.display())?;
            }
        }
        Ok(())
    }
}

fn write_outcome(outcome: &AddOutcome, out: &mut dyn Write) -> Result<()> {
    match outcome {
        AddOutcome::Rejected => writeln!(out, "Nothing to add: text is blank.")?,
        AddOutcome::Inserted { id, evicted } => {
            writeln!(out, "Added {}.", short(id))?;
            if *evicted > 0 {
                writeln!(out, "Evicted {} old entr{}.", evicted, plural_y(*evicted))?;
            }
        }
        AddOutcome::Promoted { id, evicted } => {
            writeln!(out, "Moved {} to the top.", short(id))?;
            if *evicted > 0 {
                writeln!(out, "Evicted {} old entr{}.", evicted, plural_y(*evicted))?;
            }
        }
    }
    Ok(())
}

/// Ask a yes/no question; anything but `y`/`yes` is no
pub fn confirm(prompt: &str, input: &mut dyn BufRead, out: &mut dyn Write) -> Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 {
        "y"
    } else {
        "ies"
    }
}
