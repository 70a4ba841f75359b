// src/connector/fs_ops.rs
//!
//! Filesystem effects used by the command handlers
//!
//! Thin wrappers over `std::fs` and `fs_extra` that report failures as
//! `io::Error` so handlers can attach their own message.
//!

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use fs_extra::dir::CopyOptions;
use tracing::debug;

fn from_extra(err: fs_extra::error::Error) -> io::Error {
    io::Error::other(err.to_string())
}

/// Creates an empty file, failing if anything already exists at `path`
pub fn touch(path: &Path) -> io::Result<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
}

/// Copies a file, or a directory with all of its contents, to `to`.
/// `to` must not exist yet.
pub fn copy_path(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        let options = CopyOptions {
            copy_inside: true,
            ..CopyOptions::new()
        };
        fs_extra::dir::copy(from, to, &options).map_err(from_extra)?;
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

/// Moves `from` to `to`, falling back to copy and delete when a plain rename
/// is refused (for example across filesystems)
pub fn move_path(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if from.exists() && !to.exists() => {
            debug!(from = %from.display(), to = %to.display(), error = %e, "rename refused, copying instead");
            copy_path(from, to)?;
            remove_path(from)
        }
        Err(e) => Err(e),
    }
}

/// Removes files, links and whole directory trees; missing paths are ignored
pub fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
