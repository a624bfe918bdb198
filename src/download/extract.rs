//! gzip-compressed tar extraction

use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::{InstallError, Result};

/// Unpack every entry of `archive` under `target_dir`
///
/// Entry paths, permissions and mtimes are kept as encoded in the archive.
/// Directory entries are applied after every other entry, so a read-only
/// directory does not block the files inside it. Returns the unpacked entry
/// paths, relative to `target_dir`: other entries in archive order, then
/// directories. Nothing is rolled back if an entry fails midway.
pub async fn extract_tar_gz(archive: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    let archive_path = archive.to_path_buf();
    let target_dir = target_dir.to_path_buf();

    // CPU-bound decode runs off the async workers
    tokio::task::spawn_blocking(move || unpack(&archive_path, &target_dir))
        .await
        .map_err(|e| InstallError::ExtractError {
            archive: archive.to_path_buf(),
            source: std::io::Error::other(e),
        })?
}

fn unpack(archive_path: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
    let err = |source: std::io::Error| InstallError::ExtractError {
        archive: archive_path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(archive_path).map_err(err)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_preserve_mtime(true);
    archive.set_overwrite(true);

    let mut unpacked = Vec::new();
    let mut directories = Vec::new();
    for entry in archive.entries().map_err(err)? {
        let mut entry = entry.map_err(err)?;
        let path = entry.path().map_err(err)?.into_owned();
        if entry.header().entry_type() == EntryType::Directory {
            directories.push((path, entry));
            continue;
        }
        // unpack_in creates parent directories and refuses paths escaping target_dir
        if entry.unpack_in(target_dir).map_err(err)? {
            unpacked.push(path);
        }
    }

    // deepest first, so a parent's mode is set after its children's
    directories.sort_by(|(a, _), (b, _)| b.cmp(a));
    let mut unpacked_dirs = Vec::new();
    for (path, mut entry) in directories {
        if entry.unpack_in(target_dir).map_err(err)? {
            unpacked_dirs.push(path);
        }
    }
    unpacked_dirs.reverse();
    unpacked.extend(unpacked_dirs);
    Ok(unpacked)
}
