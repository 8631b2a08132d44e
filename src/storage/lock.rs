//! Whole-file advisory locking.
//!
//! Mutations hold an exclusive `flock`-style lock on the collection file for
//! the duration of the write. The lock is advisory: it only excludes other
//! processes that follow the same convention.
//!
//! Rewrites replace the collection file by renaming a new file over it, so a
//! writer that opened the old file and then waited on its lock could end up
//! holding a lock on an unlinked inode. [`LockedFile::open`] re-checks that the
//! path still names the locked file after acquiring the lock and reopens if not.

use std::fs::{File, OpenOptions};
use std::io;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::warn;

/// An open collection file holding an exclusive lock, released on drop.
#[derive(Debug)]
pub(crate) struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    /// open `path` with `options` and block until the exclusive lock is ours
    pub(crate) fn open(path: &Path, options: &OpenOptions) -> io::Result<Self> {
        loop {
            let file = options.open(path)?;
            file.lock_exclusive()?;

            if is_current(&file, path)? {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            // the file was replaced while we waited; the stale handle unlocks on drop
            warn!(path = %path.display(), "collection file replaced while waiting for lock, reopening");
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Deref for LockedFile {
    type Target = File;

    fn deref(&self) -> &File {
        &self.file
    }
}

impl DerefMut for LockedFile {
    fn deref_mut(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        // closing the descriptor releases the lock anyway
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(unix)]
fn is_current(file: &File, path: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let held = file.metadata()?;
    let on_disk = std::fs::metadata(path)?;
    Ok(held.dev() == on_disk.dev() && held.ino() == on_disk.ino())
}

#[cfg(not(unix))]
fn is_current(_file: &File, _path: &Path) -> io::Result<bool> {
    // files that are open cannot be renamed over on this platform
    Ok(true)
}
