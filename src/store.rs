use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::error::HubError;

#[derive(Debug, Clone)]
pub struct Store {
    download_dir: Utf8PathBuf,
    data_dirs: Vec<Utf8PathBuf>,
}

impl Store {
    pub fn new(download_dir: Utf8PathBuf) -> Self {
        Self {
            download_dir,
            data_dirs: Vec::new(),
        }
    }

    pub fn download_dir(&self) -> &Utf8Path {
        &self.download_dir
    }

    pub fn data_dirs(&self) -> &[Utf8PathBuf] {
        &self.data_dirs
    }

    pub fn set_download_dir(&mut self, dir: Utf8PathBuf) -> Result<(), HubError> {
        info!("setting download directory to {dir}");
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| HubError::Filesystem(format!("create {dir}: {err}")))?;
        self.download_dir = dir;
        Ok(())
    }

    pub fn add_data_dir(&mut self, dir: Utf8PathBuf) {
        info!("adding data directory {dir}");
        self.data_dirs.push(dir);
    }

    pub fn ensure_download_dir(&self) -> Result<(), HubError> {
        fs::create_dir_all(self.download_dir.as_std_path())
            .map_err(|err| HubError::Filesystem(format!("create {}: {err}", self.download_dir)))
    }

    pub fn archive_path(&self, title: &str) -> Utf8PathBuf {
        self.download_dir.join(format!("{title}.zip"))
    }

    pub fn has_archive(&self, title: &str) -> bool {
        let name = format!("{title}.zip");
        self.data_dirs
            .iter()
            .chain(std::iter::once(&self.download_dir))
            .any(|dir| dir.join(&name).as_std_path().is_file())
    }
}
