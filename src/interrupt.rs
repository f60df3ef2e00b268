use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::HubError;

const CLEANUP_GRACE: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Unwind,
    Exit,
}

/// During a transfer Ctrl-C raises a flag and waits for the download loop to
/// clean up. If the loop is stuck in a read, the handler removes the partial
/// file itself and exits.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    streaming: Arc<AtomicBool>,
    requested: Arc<AtomicBool>,
    partial: Arc<Mutex<Option<PathBuf>>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) -> Result<(), HubError> {
        let handle = self.clone();
        ctrlc::set_handler(move || {
            if handle.on_signal(CLEANUP_GRACE) == SignalAction::Exit {
                std::process::exit(130);
            }
        })
        .map_err(|err| HubError::Filesystem(format!("install Ctrl-C handler: {err}")))
    }

    pub fn on_signal(&self, grace: Duration) -> SignalAction {
        if !self.streaming.load(Ordering::SeqCst) {
            return SignalAction::Exit;
        }
        self.request();
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !self.streaming.load(Ordering::SeqCst) {
                return SignalAction::Unwind;
            }
            thread::sleep(POLL_INTERVAL);
        }
        self.remove_partial();
        SignalAction::Exit
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn begin_stream(&self, path: PathBuf) {
        if let Ok(mut partial) = self.partial.lock() {
            *partial = Some(path);
        }
        self.streaming.store(true, Ordering::SeqCst);
    }

    pub fn end_stream(&self) {
        self.streaming.store(false, Ordering::SeqCst);
        if let Ok(mut partial) = self.partial.lock() {
            *partial = None;
        }
    }

    fn remove_partial(&self) {
        let Some(path) = self.partial.lock().ok().and_then(|mut partial| partial.take()) else {
            return;
        };
        warn!("download stalled, removing partial file {}", path.display());
        if let Err(err) = fs::remove_file(&path) {
            warn!("failed to remove {}: {err}", path.display());
        }
    }
}
