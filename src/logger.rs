//! Terminal logging with colored prefixes and progress bars.
//!
//! - `log!` prints `[module] message`, truncated to the terminal width
//! - `ProgressBars` draws one in-place bar per build stage
//! - `WatchStatus` keeps a single timestamped status line in watch mode
//!
//! ```ignore
//! log!("content"; "loaded {} posts", posts.len());
//!
//! let progress = ProgressBars::new(&[("pages", 3), ("posts", 12)]);
//! progress.inc_by_name("pages");
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Active progress bar count (for log coordination)
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// Progress bar format: "[module] [████░░░░] 42/100"

/// "[" and "]" around the module name plus the trailing space
const PREFIX_OVERHEAD: usize = 3;
/// " []" around the bar plus the space before the count
const BAR_OVERHEAD: usize = 4;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// Cursor movement only makes sense on a real terminal.
fn is_interactive() -> bool {
    stdout().is_terminal()
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to fit the terminal width.
#[allow(clippy::cast_possible_truncation)] // bar count is always small
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let interactive = is_interactive();
    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if interactive && bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    }

    let message = if interactive && !message.contains('\n') {
        let max_len = (get_terminal_width() as usize).saturating_sub(module.len() + PREFIX_OVERHEAD);
        truncate_str(message, max_len)
    } else {
        message
    };
    writeln!(stdout, "{prefix} {message}").ok();

    if interactive {
        for _ in 0..bar_count {
            writeln!(stdout).ok();
        }
    }
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to at most `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Progress Bars
// ============================================================================

/// Multiple progress bars, one terminal line each, updated in place.
///
/// Rendering is skipped entirely when stdout is not a terminal.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    interactive: bool,
    /// Set by the first `finish`; later calls must not clear log lines.
    finished: AtomicBool,
    lock: Mutex<()>,
}

struct ProgressBar {
    name: &'static str,
    prefix: ColoredString,
    total: usize,
    current: AtomicUsize,
    row: usize,
}

impl ProgressBars {
    pub fn new(modules: &[(&'static str, usize)]) -> Self {
        let interactive = is_interactive();
        if interactive {
            let mut stdout = stdout().lock();
            for _ in 0..modules.len() {
                writeln!(stdout).ok();
            }
            stdout.flush().ok();
            BAR_COUNT.store(modules.len(), Ordering::SeqCst);
        }

        let bars = modules
            .iter()
            .enumerate()
            .map(|(row, &(name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name),
                total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            interactive,
            finished: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    /// Create bars only for non-empty stages.
    ///
    /// Returns `None` when there is at most one item in total.
    pub fn new_filtered(modules: &[(&'static str, usize)]) -> Option<Self> {
        let filtered: Vec<_> = modules.iter().filter(|(_, n)| *n > 0).copied().collect();
        let total: usize = filtered.iter().map(|(_, n)| n).sum();
        (total > 1).then(|| Self::new(&filtered))
    }

    pub fn inc_by_name(&self, name: &str) {
        if let Some(bar) = self.bars.iter().find(|bar| bar.name == name) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.display(bar, current);
        }
    }

    #[allow(clippy::cast_possible_truncation)] // bar count is always small
    fn display(&self, bar: &ProgressBar, current: usize) {
        if !self.interactive {
            return;
        }
        let _guard = self.lock.lock().ok();

        let count = format!("{}/{}", current, bar.total);
        let overhead = bar.name.len() + PREFIX_OVERHEAD + BAR_OVERHEAD + count.len();
        let bar_width = (get_terminal_width() as usize)
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);
        let filled = (current * bar_width).checked_div(bar.total).unwrap_or(0).min(bar_width);
        let drawn = "█".repeat(filled) + &"░".repeat(bar_width - filled);

        let mut stdout = stdout().lock();
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{}] {}", bar.prefix, drawn, count).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Clear all progress bars from the terminal. Only the first call does anything.
    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&self) {
        if self.finished.swap(true, Ordering::SeqCst) || !self.interactive {
            return;
        }
        BAR_COUNT.store(0, Ordering::SeqCst);
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        let rows = self.bars.len() as u16;
        if rows == 0 {
            return;
        }
        execute!(stdout, cursor::MoveUp(rows)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

// ============================================================================
// Watch Status
// ============================================================================

/// Timestamped status line for watch mode.
///
/// Each message replaces the previous one so repeated rebuilds do not
/// scroll the terminal.
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.display("✓".green().to_string(), message);
    }

    /// Failures keep their detail lines visible until the next rebuild.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display("✗".red().to_string(), &message);
    }

    fn display(&mut self, symbol: String, message: &str) {
        let mut stdout = stdout().lock();

        if is_interactive() && self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", chrono::Local::now().format("%H:%M:%S")).dimmed();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = line_count(message);
    }
}

fn line_count(message: &str) -> usize {
    message.matches('\n').count() + 1
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_short_string() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_str_needs_truncation() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "€" is 3 bytes; cutting at 4 must back off to 3
        assert_eq!(truncate_str("€€", 4), "€");
        assert_eq!(truncate_str("a€b", 3), "a");
    }

    #[test]
    fn test_truncate_str_zero_limit() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_colorize_prefix_wraps_module() {
        colored::control::set_override(false);
        assert_eq!(colorize_prefix("build").to_string(), "[build]");
        assert_eq!(colorize_prefix("warn").to_string(), "[warn]");
    }

    #[test]
    fn test_new_filtered_skips_trivial_work() {
        assert!(ProgressBars::new_filtered(&[("pages", 1), ("posts", 0)]).is_none());
        let bars = ProgressBars::new_filtered(&[("pages", 2), ("posts", 0)]).unwrap();
        assert_eq!(bars.bars.len(), 1);
        assert_eq!(bars.bars[0].name, "pages");
    }

    #[test]
    fn test_inc_by_name_counts() {
        let bars = ProgressBars::new(&[("pages", 2), ("posts", 3)]);
        bars.inc_by_name("posts");
        bars.inc_by_name("posts");
        bars.inc_by_name("missing");
        assert_eq!(bars.bars[0].current.load(Ordering::Relaxed), 0);
        assert_eq!(bars.bars[1].current.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_finish_runs_once() {
        let bars = ProgressBars::new(&[("pages", 2)]);
        assert!(!bars.finished.load(Ordering::SeqCst));
        bars.finish();
        assert!(bars.finished.load(Ordering::SeqCst));
        bars.finish();
        assert!(bars.finished.load(Ordering::SeqCst));
        drop(bars);
    }

    #[test]
    fn test_watch_status_tracks_lines() {
        let mut status = WatchStatus::new();
        assert_eq!(status.last_lines, 0);
        status.error("build failed", "template `main` not found\n  in pages/index.html");
        assert_eq!(status.last_lines, 3);
        status.success("rebuilt");
        assert_eq!(status.last_lines, 1);
    }

    #[test]
    fn test_line_count() {
        assert_eq!(line_count("one"), 1);
        assert_eq!(line_count("one\ntwo"), 2);
    }
}
