use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{info, warn};
use zip::ZipArchive;

use crate::error::HubError;

pub const MIN_ARCHIVE_BYTES: u64 = 1_000_000;

/// Reads every entry through the decompressor so that CRC mismatches and
/// structural damage surface as errors.
pub fn validate_zip(zip_path: &Path) -> Result<(), HubError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| HubError::Archive(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive = ZipArchive::new(file).map_err(|err| HubError::Archive(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|err| HubError::Archive(err.to_string()))?;
        if entry.is_dir() {
            continue;
        }
        io::copy(&mut entry, &mut io::sink())
            .map_err(|err| HubError::Archive(format!("{}: {err}", entry.name())))?;
    }
    Ok(())
}

pub fn is_valid_archive(path: &Path, min_size: u64) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let size = fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    if size <= min_size {
        warn!("the downloaded scene is too small: {name} ({size} bytes)");
        return false;
    }
    match validate_zip(path) {
        Ok(()) => {
            info!("file seems to be valid: {name}");
            true
        }
        Err(err) => {
            warn!("the downloaded scene is corrupt: {name}: {err}");
            false
        }
    }
}

pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), HubError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|err| HubError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".scihub-fetch")
        .tempfile_in(parent)
        .map_err(|err| HubError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| HubError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| HubError::Filesystem(err.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_not_an_archive() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("page.zip");
        fs::write(&path, vec![b'<'; 2_000_000]).unwrap();
        assert!(validate_zip(&path).is_err());
        assert!(!is_valid_archive(&path, MIN_ARCHIVE_BYTES));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("urls.txt");
        write_atomic(&path, b"first\n").unwrap();
        write_atomic(&path, b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
    }
}
