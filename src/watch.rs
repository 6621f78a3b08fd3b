//! Directory watching and the session loop.
//!
//! The filesystem backend pushes candidate paths into a channel. A single
//! loop takes them one at a time, waits for the writer to settle, and hands
//! each to the [`Processor`] before taking the next.

use crate::error::Result;
use crate::formats::is_supported_path;
use crate::processor::Processor;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

/// Something that yields candidate paths until it is exhausted.
pub trait PathSource {
    /// Wait for the next candidate path. `None` means no more will arrive.
    fn next_path(&mut self) -> impl Future<Output = Option<PathBuf>>;
}

impl PathSource for UnboundedReceiver<PathBuf> {
    async fn next_path(&mut self) -> Option<PathBuf> {
        self.recv().await
    }
}

/// Non-recursive watch on one directory.
pub struct DirectoryWatcher {
    // Dropping the watcher stops notifications.
    _watcher: RecommendedWatcher,
    rx: UnboundedReceiver<PathBuf>,
}

impl DirectoryWatcher {
    /// Start watching `directory` for new and renamed-in files.
    pub fn new(directory: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for path in candidate_paths(&event) {
                    debug!(path = %path.display(), kind = ?event.kind, "candidate");
                    // The receiver is gone only during shutdown.
                    let _ = tx.send(path);
                }
            }
            Err(e) => warn!(error = %e, "watch backend error"),
        })?;
        watcher.watch(directory, RecursiveMode::NonRecursive)?;

        debug!(directory = %directory.display(), "watching");
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }
}

impl PathSource for DirectoryWatcher {
    async fn next_path(&mut self) -> Option<PathBuf> {
        self.rx.recv().await
    }
}

/// Paths worth processing for one filesystem event.
///
/// Creations and rename destinations with a supported image extension
/// qualify. Folder creations and every other event kind do not.
pub fn candidate_paths(event: &Event) -> Vec<PathBuf> {
    let mut paths = match event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => event.paths.clone(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            event.paths.last().cloned().into_iter().collect()
        }
        // Some backends cannot tell source from destination.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            event.paths.iter().filter(|p| p.exists()).cloned().collect()
        }
        _ => Vec::new(),
    };
    paths.retain(|p| is_supported_path(p));
    paths
}

/// Drive `processor` from `source` until `shutdown` resolves or the source
/// is exhausted.
///
/// Each path is processed to completion, after a `settle` delay, before the
/// next one is taken. Paths the processor has no use for, such as the
/// echo of a file it just rewrote, are dropped before the delay and are not
/// counted. Shutdown is only observed between files.
pub async fn run<S, F>(source: &mut S, processor: &mut Processor, settle: Duration, shutdown: F)
where
    S: PathSource,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let path = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            next = source.next_path() => match next {
                Some(path) => path,
                None => break,
            },
        };

        if !processor.wants(&path) {
            debug!(path = %path.display(), "ignoring notification");
            continue;
        }

        tokio::time::sleep(settle).await;
        processor.handle(&path);
    }
}
