use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

/// Background file watcher for `foothold.toml`.
pub struct ConfigWatcher {
    rx: Receiver<()>,
    // kept so `notify_changed` works in tests and when the watcher thread is disabled
    tx: Sender<()>,
}

impl ConfigWatcher {
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        let thread_tx = tx.clone();
        std::thread::spawn(move || {
            use notify::{EventKind, RecursiveMode, Watcher};
            let tx = thread_tx;
            match notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Modify(_)
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                        | EventKind::Any => {
                            let _ = tx.send(());
                        }
                        _ => {}
                    }
                }
            }) {
                Ok(mut watcher) => {
                    if let Err(e) = watcher.watch(path.as_path(), RecursiveMode::NonRecursive) {
                        log::warn!("config watch on {} failed: {}", path.display(), e);
                        return;
                    }
                    log::info!("watching {} for changes", path.display());
                    loop {
                        std::thread::sleep(std::time::Duration::from_secs(3600));
                    }
                }
                Err(e) => log::warn!("config watcher unavailable: {}", e),
            }
        });
        Self { rx, tx }
    }

    /// A watcher that never fires on its own.
    pub fn detached() -> Self {
        let (tx, rx) = mpsc::channel::<()>();
        Self { rx, tx }
    }

    pub fn notify_changed(&self) {
        let _ = self.tx.send(());
    }

    /// True when at least one change arrived since the last call; bursts collapse.
    pub fn take_changed(&self) -> bool {
        self.rx.try_iter().count() > 0
    }
}
