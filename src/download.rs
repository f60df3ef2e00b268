use std::fs::{self, File};
use std::io::{self, Read, Write};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::HubError;
use crate::fs_util::{MIN_ARCHIVE_BYTES, is_valid_archive};
use crate::hub::HubClient;
use crate::interrupt::Interrupt;
use crate::scene::{Scene, is_plain_title};
use crate::session::{ProgressEvent, ProgressSink};
use crate::store::Store;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Downloaded { path: String },
    Failed { path: String },
    SkippedTooSmall { size: u64 },
    SkippedConnection { reason: String },
    SkippedMissingLength,
    SkippedFilesystem { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedScene {
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DownloadSummary {
    pub success: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<SkippedScene>,
}

impl DownloadSummary {
    pub fn record(&mut self, scene: &Scene, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { path } => self.success.push(path),
            DownloadOutcome::Failed { path } => self.failed.push(path),
            DownloadOutcome::SkippedTooSmall { size } => self.skipped.push(SkippedScene {
                title: scene.title.clone(),
                reason: format!("too small ({size} bytes)"),
            }),
            DownloadOutcome::SkippedConnection { reason } => self.skipped.push(SkippedScene {
                title: scene.title.clone(),
                reason: format!("connection error: {reason}"),
            }),
            DownloadOutcome::SkippedMissingLength => self.skipped.push(SkippedScene {
                title: scene.title.clone(),
                reason: "Content-Length not found".to_string(),
            }),
            DownloadOutcome::SkippedFilesystem { reason } => self.skipped.push(SkippedScene {
                title: scene.title.clone(),
                reason: format!("filesystem error: {reason}"),
            }),
        }
    }
}

/// Only an interruption while streaming is an error; every other problem is
/// reported through the outcome.
pub fn download_scene<C: HubClient>(
    client: &C,
    scene: &Scene,
    store: &Store,
    interrupt: &Interrupt,
    sink: &dyn ProgressSink,
) -> Result<DownloadOutcome, HubError> {
    if !is_plain_title(&scene.title) {
        warn!("refusing to write outside the store: {:?}", scene.title);
        return Ok(DownloadOutcome::SkippedFilesystem {
            reason: format!("unsafe title {:?}", scene.title),
        });
    }
    let path = store.archive_path(&scene.title);
    info!("download file path: {path}");

    let response = match client.open_download(&scene.url) {
        Ok(response) => response,
        Err(err) => {
            warn!("connection error for {}: {err}", scene.title);
            return Ok(DownloadOutcome::SkippedConnection {
                reason: err.to_string(),
            });
        }
    };
    if !(200..300).contains(&response.status) {
        warn!("{} answered with status {}", scene.url, response.status);
    }
    let Some(size) = response.content_length else {
        warn!("Content-Length not found: {}", scene.url);
        return Ok(DownloadOutcome::SkippedMissingLength);
    };
    if size < MIN_ARCHIVE_BYTES {
        warn!("the found scene is too small: {} ({size} bytes) {}", scene.title, scene.url);
        return Ok(DownloadOutcome::SkippedTooSmall { size });
    }
    info!("size of the scene: {:.2} MB", size as f64 / 1024.0 / 1024.0);

    let file = match File::create(path.as_std_path()) {
        Ok(file) => file,
        Err(err) => {
            warn!("cannot create {path}: {err}");
            return Ok(DownloadOutcome::SkippedFilesystem {
                reason: format!("cannot create {path}: {err}"),
            });
        }
    };

    interrupt.begin_stream(path.clone().into_std_path_buf());
    let streamed = stream_body(response.body, file, &scene.title, size, interrupt, sink);
    interrupt.end_stream();
    let written = match streamed {
        Streamed::Complete(written) => written,
        Streamed::Interrupted => {
            warn!("keyboard interruption, removing current download {path}");
            remove_quietly(&path);
            return Err(HubError::Interrupted(path.into_std_path_buf()));
        }
    };
    info!("{written} of {size} bytes written");
    sink.event(ProgressEvent::TransferDone {
        name: scene.title.clone(),
    });

    info!("checking if file is valid: {path}");
    if is_valid_archive(path.as_std_path(), MIN_ARCHIVE_BYTES) {
        Ok(DownloadOutcome::Downloaded {
            path: path.to_string(),
        })
    } else {
        info!("invalid file is being deleted: {path}");
        remove_quietly(&path);
        Ok(DownloadOutcome::Failed {
            path: path.to_string(),
        })
    }
}

enum Streamed {
    Complete(u64),
    Interrupted,
}

fn stream_body(
    mut body: Box<dyn Read + Send>,
    mut file: File,
    name: &str,
    total: u64,
    interrupt: &Interrupt,
    sink: &dyn ProgressSink,
) -> Streamed {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        if interrupt.is_requested() {
            return Streamed::Interrupted;
        }
        let read = match body.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!("transfer of {name} broke off after {written} bytes: {err}");
                break;
            }
        };
        if let Err(err) = file.write_all(&buffer[..read]) {
            warn!("writing {name} failed after {written} bytes: {err}");
            break;
        }
        written += read as u64;
        sink.event(ProgressEvent::Transfer {
            name: name.to_string(),
            written,
            total,
        });
    }
    if interrupt.is_requested() {
        return Streamed::Interrupted;
    }
    if let Err(err) = file.flush() {
        warn!("flushing {name} failed: {err}");
    }
    Streamed::Complete(written)
}

fn remove_quietly(path: &Utf8Path) {
    if let Err(err) = fs::remove_file(path.as_std_path()) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!("failed to remove {path}: {err}");
        }
    }
}
