//! File system watcher for live rebuilds.
//!
//! ```text
//! notify ──► WatchEvent { root, path, kind } ──► channel ──► run_rebuild_loop
//!                                                               │
//!                                          quiet period elapsed ▼
//!                                                         SiteBuilder::run
//! ```
//!
//! A single thread drains the channel, so rebuilds never overlap. Events
//! that arrive during a rebuild wait in the channel and trigger the next one.

use crate::{build::SiteBuilder, config::SiteConfig, log, logger::WatchStatus};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{Receiver, RecvTimeoutError, Sender, channel},
    },
    time::{Duration, Instant},
};

/// Source directory an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchRoot {
    Templates,
    Static,
    Content,
    Pages,
}

impl WatchRoot {
    pub const ALL: [Self; 4] = [Self::Templates, Self::Static, Self::Content, Self::Pages];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Templates => "templates",
            Self::Static => "static",
            Self::Content => "content",
            Self::Pages => "pages",
        }
    }

    fn path(self, config: &SiteConfig) -> &Path {
        match self {
            Self::Templates => &config.build.templates,
            Self::Static => &config.build.static_dir,
            Self::Content => &config.build.content,
            Self::Pages => &config.build.pages,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    const fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Modify(_) => Some(Self::Modified),
            EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }
}

/// One change to one watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub root: WatchRoot,
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        };
        let name = self.path.file_name().unwrap_or(self.path.as_os_str());
        write!(f, "{}/{} {kind}", self.root.name(), name.to_string_lossy())
    }
}

/// Watched directories, paired with the root they represent.
type Roots = Vec<(WatchRoot, PathBuf)>;

fn watch_roots(config: &SiteConfig) -> Roots {
    WatchRoot::ALL
        .into_iter()
        .map(|root| (root, root.path(config).to_path_buf()))
        .collect()
}

/// Attribute `path` to the most specific root containing it.
///
/// Roots may nest (e.g. `pages` inside `content`), so the longest
/// matching prefix wins.
fn classify(roots: &[(WatchRoot, PathBuf)], path: &Path) -> Option<WatchRoot> {
    roots
        .iter()
        .filter(|(_, dir)| path.starts_with(dir))
        .max_by_key(|(_, dir)| dir.components().count())
        .map(|(root, _)| *root)
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}

/// Translate one notify event into zero or more tagged events.
fn translate(roots: &[(WatchRoot, PathBuf)], event: Event) -> Vec<WatchEvent> {
    let Some(kind) = ChangeKind::from_event(&event.kind) else {
        return Vec::new();
    };
    event
        .paths
        .into_iter()
        .filter(|path| !is_temp_file(path))
        .filter_map(|path| {
            classify(roots, &path).map(|root| WatchEvent { root, path, kind })
        })
        .collect()
}

// =============================================================================
// Rebuild Loop
// =============================================================================

/// Collects events until the quiet period has passed since the last one.
struct Debouncer {
    pending: Vec<WatchEvent>,
    last_event: Option<Instant>,
    quiet: Duration,
}

impl Debouncer {
    const fn new(quiet: Duration) -> Self {
        Self {
            pending: Vec::new(),
            last_event: None,
            quiet,
        }
    }

    fn add(&mut self, event: WatchEvent) {
        self.pending.push(event);
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.remaining().is_zero()
    }

    /// Time left before the pending batch may be flushed.
    fn remaining(&self) -> Duration {
        self.last_event
            .map_or(Duration::ZERO, |t| self.quiet.saturating_sub(t.elapsed()))
    }

    fn take(&mut self) -> Vec<WatchEvent> {
        self.last_event = None;
        std::mem::take(&mut self.pending)
    }
}

/// Drain `rx`, calling `rebuild` once per debounced batch.
///
/// With a zero quiet period every event is its own batch. Pending events
/// are flushed when the channel closes, then the loop returns.
pub fn run_rebuild_loop<F>(rx: &Receiver<WatchEvent>, quiet: Duration, mut rebuild: F)
where
    F: FnMut(&[WatchEvent]),
{
    let mut debouncer = Debouncer::new(quiet);

    loop {
        let received = if debouncer.pending.is_empty() {
            rx.recv().map_err(|_| RecvTimeoutError::Disconnected)
        } else {
            rx.recv_timeout(debouncer.remaining())
        };

        match received {
            Ok(event) => debouncer.add(event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                if !debouncer.pending.is_empty() {
                    rebuild(&debouncer.take());
                }
                return;
            }
        }

        if debouncer.ready() {
            rebuild(&debouncer.take());
        }
    }
}

/// Run one full rebuild for `events` and report the outcome.
fn rebuild(config: &SiteConfig, events: &[WatchEvent], status: &mut WatchStatus) {
    match events {
        [event] => log!("watch"; "{event}"),
        [first, ..] => log!("watch"; "{first} (+{} more)", events.len() - 1),
        [] => return,
    }

    match SiteBuilder::new(config).run() {
        Ok(report) => status.success(&format!("rebuilt: {report}")),
        Err(err) => {
            let err = anyhow::Error::new(err);
            let detail = err
                .chain()
                .skip(1)
                .map(|cause| format!("  {cause}"))
                .collect::<Vec<_>>()
                .join("\n");
            status.error(&err.to_string(), &detail);
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the source directories and rebuild on every change. Blocks.
pub fn watch_for_changes_blocking(config: Arc<SiteConfig>) -> Result<()> {
    let roots: Roots = watch_roots(&config)
        .into_iter()
        .filter(|(_, dir)| dir.exists())
        .collect();

    let (tx, rx) = channel::<WatchEvent>();
    let mut watcher = notify::recommended_watcher(event_handler(roots.clone(), tx))
        .context("Failed to create file watcher")?;

    for (root, dir) in &roots {
        watcher
            .watch(dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}: {}", root.name(), dir.display()))?;
    }
    let names: Vec<_> = roots.iter().map(|(root, _)| root.name()).collect();
    log!("watch"; "watching {}", names.join(", "));

    let mut status = WatchStatus::new();
    run_rebuild_loop(&rx, config.serve.debounce(), |events| {
        rebuild(&config, events, &mut status);
    });

    Ok(())
}

fn event_handler(
    roots: Roots,
    tx: Sender<WatchEvent>,
) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |result| match result {
        Ok(event) => {
            for event in translate(&roots, event) {
                // receiver gone means the rebuild loop has exited
                if tx.send(event).is_err() {
                    return;
                }
            }
        }
        Err(err) => log!("watch"; "error: {err}"),
    }
}
