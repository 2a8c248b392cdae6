//! Swapping model data files in and out of a static directory.
//!
//! modelpy picks its footprint format from whatever files are present, so a
//! benchmark stashes the formats it does not want into `<static>/stash/`
//! before a run and restores them afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ModelbenchError, Result};

const STASH_DIR: &str = "stash";

/// Whether a stash entry is a plain file or a directory (e.g. a Parquet dataset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    fn matches(&self, path: &Path) -> bool {
        match self {
            EntryKind::File => path.is_file(),
            EntryKind::Directory => path.is_dir(),
        }
    }
}

/// Moves data files between a static directory and its stash.
///
/// A move never overwrites: an entry already present at the destination
/// fails with `StashConflict` and both copies are left in place.
pub struct ModelRunFileManager {
    static_path: PathBuf,
}

impl ModelRunFileManager {
    /// Creates the manager, creating `<static_path>/stash/` if it is missing.
    pub fn new(static_path: impl Into<PathBuf>) -> Result<Self> {
        let manager = Self {
            static_path: static_path.into(),
        };
        fs::create_dir_all(manager.stash_path())?;
        Ok(manager)
    }

    pub fn static_path(&self) -> &Path {
        &self.static_path
    }

    pub fn stash_path(&self) -> PathBuf {
        self.static_path.join(STASH_DIR)
    }

    /// Moves `name` from the static directory into the stash.
    ///
    /// Returns `false` without touching anything when the source does not
    /// exist or is not of the given kind.
    pub fn move_to_stash(&self, name: &str, kind: EntryKind) -> Result<bool> {
        let from = self.static_path.join(name);
        let to = self.stash_path().join(name);
        move_entry(&from, &to, kind)
    }

    /// Moves `name` from the stash back into the static directory.
    pub fn get_from_stash(&self, name: &str, kind: EntryKind) -> Result<bool> {
        let from = self.stash_path().join(name);
        let to = self.static_path.join(name);
        move_entry(&from, &to, kind)
    }
}

fn move_entry(from: &Path, to: &Path, kind: EntryKind) -> Result<bool> {
    if !kind.matches(from) {
        log::debug!("nothing to move at {}", from.display());
        return Ok(false);
    }

    if to.exists() {
        log::warn!(
            "not moving {}: {} already exists",
            from.display(),
            to.display()
        );
        return Err(ModelbenchError::StashConflict(to.to_path_buf()));
    }

    if fs::rename(from, to).is_err() {
        // rename fails across filesystems; fall back to copy then delete
        match kind {
            EntryKind::File => {
                fs::copy(from, to)?;
                fs::remove_file(from)?;
            }
            EntryKind::Directory => {
                copy_dir_all(from, to)?;
                fs::remove_dir_all(from)?;
            }
        }
    }

    log::debug!("moved {} -> {}", from.display(), to.display());
    Ok(true)
}

fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
