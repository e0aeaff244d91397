//! Zip bundles for run logs and processed feed files.

use async_trait::async_trait;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::domain::ports::{ArchiveError, Archiver};

/// Writes deflate-compressed zip archives.
///
/// Entries are stored under their file name. In append mode a name that is
/// already taken gets a numeric suffix (`person_1.txt`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn create_archive(
        &self,
        archive: &Path,
        paths: &[PathBuf],
        append: bool,
    ) -> Result<(), ArchiveError> {
        let archive = archive.to_path_buf();
        let paths = paths.to_vec();

        tokio::task::spawn_blocking(move || write_archive(&archive, &paths, append))
            .await
            .map_err(|e| ArchiveError::Write(format!("archive task failed: {e}")))?
    }
}

fn write_archive(archive: &Path, paths: &[PathBuf], append: bool) -> Result<(), ArchiveError> {
    if append && archive.exists() {
        let existing = existing_entry_names(archive)?;
        let file = OpenOptions::new().read(true).write(true).open(archive)?;
        let writer = ZipWriter::new_append(file)?;
        debug!(archive = %archive.display(), existing = existing.len(), "appending to archive");
        return write_entries(writer, paths, existing);
    }

    let file = File::create(archive)?;
    let result = write_entries(ZipWriter::new(file), paths, HashSet::new());
    if result.is_err() {
        if let Err(e) = std::fs::remove_file(archive) {
            warn!(archive = %archive.display(), error = %e, "failed to remove partial archive");
        }
    }
    result
}

fn existing_entry_names(archive: &Path) -> Result<HashSet<String>, ArchiveError> {
    let reader = ZipArchive::new(File::open(archive)?)?;
    Ok(reader.file_names().map(str::to_string).collect())
}

fn write_entries(
    mut writer: ZipWriter<File>,
    paths: &[PathBuf],
    mut taken: HashSet<String>,
) -> Result<(), ArchiveError> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in paths {
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ArchiveError::Write(format!("not a file: {}", path.display())))?;
        let name = unique_entry_name(&base, &taken);

        let mut source = File::open(path)?;
        writer.start_file(name.as_str(), options)?;
        std::io::copy(&mut source, &mut writer)?;
        taken.insert(name);
    }

    writer.finish()?;
    Ok(())
}

/// `base`, or `stem_N.ext` with the smallest free `N`.
fn unique_entry_name(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (base, None),
    };

    (1..)
        .map(|n| match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
