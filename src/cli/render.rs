//! Terminal rendering of history entries

use crate::history::Entry;
use colored::Colorize;

/// Widest preview shown for one entry, in characters
pub const PREVIEW_WIDTH: usize = 60;

/// Options for [`render_entries`]
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub color: bool,
    pub now_millis: i64,
}

/// One line per entry: position, pin marker, short id, age and preview
///
/// `rows` pairs each entry with its 1-based position in the full history.
pub fn render_entries(rows: &[(usize, &Entry)], options: RenderOptions) -> String {
    let mut out = String::new();
    for (position, entry) in rows {
        let marker = if entry.pinned { "*" } else { " " };
        let short_id: String = entry.id.chars().take(8).collect();
        let age = format_age(options.now_millis.saturating_sub(entry.timestamp));
        let preview = preview(&entry.text, PREVIEW_WIDTH);

        let line = if options.color {
            format!(
                "{:>3} {} {}  {:>4}  {}",
                position,
                marker.yellow().bold(),
                short_id.dimmed(),
                age.cyan(),
                preview
            )
        } else {
            format!(
                "{:>3} {} {}  {:>4}  {}",
                position, marker, short_id, age, preview
            )
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// First line of `text`, cut to `width` characters, noting hidden lines
pub fn preview(text: &str, width: usize) -> String {
    let trimmed = text.trim();
    let mut lines = trimmed.lines();
    let first = lines.next().unwrap_or("");
    let hidden = lines.count();

    let mut shown: String = first.chars().take(width).collect();
    if first.chars().count() > width {
        shown.pop();
        shown.push('…');
    }
    if hidden > 0 {
        shown.push_str(&format!(" (+{} lines)", hidden));
    }
    shown
}

/// Compact age such as `42s`, `5m`, `3h` or `2d`
pub fn format_age(elapsed_millis: i64) -> String {
    let secs = elapsed_millis.max(0) / 1000;
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}
