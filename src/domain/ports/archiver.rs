use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::errors::ArchiveError;

/// Packs files into a compressed bundle.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Write `paths` into the bundle at `archive`.
    ///
    /// With `append` set and an existing bundle, the files are added to it
    /// instead of replacing it.
    async fn create_archive(
        &self,
        archive: &Path,
        paths: &[PathBuf],
        append: bool,
    ) -> Result<(), ArchiveError>;
}
