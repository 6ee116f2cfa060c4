//! Self-redrawing per-asset status block.
//!
//! Each [`AssetReporter`] owns one block of terminal lines. Every call to
//! [`AssetReporter::report`] erases exactly the lines that reporter wrote
//! last time and draws the new block in their place. Output written before
//! the block, including blocks of earlier reporters, is never touched.
//!
//! Layout:
//!
//! ```text
//!  UPLOADED   static/js/main.3f2a.js
//!         ├ Contents changed.
//!         └ Local ETag: "…"
//! ```

use colored::{ColoredString, Colorize};
use std::io::{self, Write};

/// Width of the status badge column.
pub const BADGE_WIDTH: usize = 11;

/// Columns before a detail line's tree connector.
const DETAILS_RESERVED: usize = BADGE_WIDTH - 3;

const MOVE_UP_AND_ERASE: &str = "\x1b[1A\x1b[2K";

/// Reads the current terminal width in columns.
pub type Columns = fn() -> usize;

/// Width of stdout, or 80 when it is not a terminal.
pub fn terminal_columns() -> usize {
    match console::Term::stdout().size_checked() {
        Some((_rows, cols)) if cols > 0 => cols as usize,
        _ => 80,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBadge {
    Working,
    Ignored,
    Skipped,
    Uploaded,
    DryRun,
    Error,
}

impl StatusBadge {
    pub fn text(self) -> &'static str {
        match self {
            StatusBadge::Working => "WORKING..",
            StatusBadge::Ignored => "IGNORED",
            StatusBadge::Skipped => "SKIPPED",
            StatusBadge::Uploaded => "UPLOADED",
            StatusBadge::DryRun => "DRY RUN",
            StatusBadge::Error => "ERROR",
        }
    }

    fn paint(self, padded: &str) -> ColoredString {
        match self {
            StatusBadge::Working => padded.bold().on_truecolor(0xf1, 0xca, 0x81).truecolor(0, 0, 0),
            StatusBadge::Ignored => padded.bold(),
            StatusBadge::Skipped => padded.bold().on_truecolor(0x39, 0x42, 0x53),
            StatusBadge::Uploaded => padded.bold().on_truecolor(0x9c, 0xbf, 0x87).truecolor(0, 0, 0),
            StatusBadge::DryRun => padded.bold().on_truecolor(0xf2, 0xca, 0x5f).truecolor(0, 0, 0),
            StatusBadge::Error => padded.bold().on_truecolor(0xcd, 0x5a, 0x68),
        }
    }
}

/// Truncate or center-pad `text` to exactly [`BADGE_WIDTH`] characters.
pub fn pad_badge(text: &str) -> String {
    let len = text.chars().count();
    if len >= BADGE_WIDTH {
        return text.chars().take(BADGE_WIDTH).collect();
    }
    let remaining = BADGE_WIDTH - len;
    let left = remaining / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(remaining - left))
}

/// Terminal columns `c` occupies: 2 for wide CJK and emoji, 0 for
/// combining marks.
fn char_columns(c: char) -> usize {
    let mut buf = [0u8; 4];
    console::measure_text_width(c.encode_utf8(&mut buf))
}

/// Hard-wrap `text` so no line is wider than `width` terminal columns.
/// Embedded newlines start new lines; an empty string is one empty line.
fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for segment in text.split('\n') {
        let mut line = String::new();
        let mut used = 0;
        for c in segment.chars() {
            let cols = char_columns(c);
            if used + cols > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            line.push(c);
            used += cols;
        }
        lines.push(line);
    }
    lines
}

/// Lay out one block for a terminal `columns` wide.
pub fn render_block(
    columns: usize,
    asset_name: &str,
    badge: StatusBadge,
    details: &[String],
) -> Vec<String> {
    let mut block = Vec::new();

    // Title wraps into the space right of the badge and its separator.
    let title_width = columns.saturating_sub(BADGE_WIDTH + 1);
    for (index, line) in hard_wrap(asset_name, title_width).into_iter().enumerate() {
        let prefix = if index == 0 {
            badge.paint(&pad_badge(badge.text())).to_string()
        } else {
            " ".repeat(BADGE_WIDTH)
        };
        block.push(format!("{} {}", prefix, line.dimmed()));
    }

    let detail_width = columns.saturating_sub(DETAILS_RESERVED + 1);
    for (detail_index, detail) in details.iter().enumerate() {
        let is_last = detail_index + 1 == details.len();
        for (line_index, line) in hard_wrap(detail, detail_width).into_iter().enumerate() {
            let connector = match (is_last, line_index == 0) {
                (true, true) => "└",
                (true, false) => " ",
                (false, true) => "├",
                (false, false) => "│",
            };
            let prefix = format!("{}{}", " ".repeat(DETAILS_RESERVED - 1), connector);
            block.push(format!("{} {}", prefix.white(), line));
        }
    }

    block
}

/// Owns one redrawable block on `out`.
pub struct AssetReporter<W: Write> {
    out: W,
    columns: Columns,
    prev_lines: usize,
}

impl<W: Write> AssetReporter<W> {
    pub fn new(out: W, columns: Columns) -> Self {
        Self {
            out,
            columns,
            prev_lines: 0,
        }
    }

    /// Number of lines the last render occupied.
    pub fn line_count(&self) -> usize {
        self.prev_lines
    }

    /// Replace this reporter's block with a fresh render.
    ///
    /// Width is read on every call so a resized terminal is picked up.
    pub fn report(
        &mut self,
        asset_name: &str,
        badge: StatusBadge,
        details: &[String],
    ) -> io::Result<()> {
        let block = render_block((self.columns)(), asset_name, badge, details);

        let mut output = MOVE_UP_AND_ERASE.repeat(self.prev_lines);
        for line in &block {
            output.push_str(line);
            output.push('\n');
        }
        self.out.write_all(output.as_bytes())?;
        self.out.flush()?;

        self.prev_lines = block.len();
        Ok(())
    }
}
