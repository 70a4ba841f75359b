// src/path/mod.rs
//!
//! Path handles and sandbox containment
//!
//! A [`PathHandle`] is an absolute path that is expected to be the root or a
//! descendant of it. The expectation is not enforced by construction: decoded
//! identifiers and request names can carry `..` components, so everything that
//! touches the filesystem goes through [`Sandbox::check`] first.
//!

pub mod codec;


use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

pub use codec::{CodecVersion, DecodeError, PathCodec};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathHandle(PathBuf);

impl PathHandle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn join<P: AsRef<Path>>(&self, name: P) -> Self {
        Self(self.0.join(name))
    }

    /// Final component, or an empty string for `/`
    pub fn basename(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Self> {
        self.0.parent().map(|p| Self(p.to_path_buf()))
    }

    /// Root-relative display form: `.` for the root itself, `a/b` below it.
    pub fn relative_to(&self, root: &PathHandle) -> String {
        match self.0.strip_prefix(&root.0) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => separators_to_slash(rel.to_string_lossy().into_owned()),
            Err(_) => self.0.to_string_lossy().to_string(),
        }
    }

    /// Whether the final component is valid UTF-8 and can be given an
    /// identifier
    pub fn has_utf8_name(&self) -> bool {
        self.0.file_name().map_or(true, |n| n.to_str().is_some())
    }

    pub fn exists(&self) -> bool {
        self.0.exists()
    }

    pub fn is_dir(&self) -> bool {
        self.0.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.0.is_file()
    }

    pub fn is_symlink(&self) -> bool {
        fs::symlink_metadata(&self.0)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    /// Human readable entry kind used in error messages
    pub fn ftype(&self) -> &'static str {
        match fs::symlink_metadata(&self.0) {
            Ok(meta) if meta.file_type().is_symlink() => "link",
            Ok(meta) if meta.is_dir() => "directory",
            Ok(meta) if meta.is_file() => "file",
            Ok(_) => "unknown",
            Err(_) => "file",
        }
    }

    pub fn size(&self) -> u64 {
        fs::metadata(&self.0).map(|m| m.len()).unwrap_or(0)
    }

    pub fn modified(&self) -> Option<SystemTime> {
        fs::symlink_metadata(&self.0)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Readable according to the permission bits
    pub fn is_readable(&self) -> bool {
        match fs::metadata(&self.0) {
            #[cfg(unix)]
            Ok(meta) => {
                use std::os::unix::fs::PermissionsExt;
                meta.permissions().mode() & 0o444 != 0
            }
            #[cfg(not(unix))]
            Ok(_) => true,
            Err(_) => false,
        }
    }

    /// Writable according to the permission bits
    pub fn is_writable(&self) -> bool {
        fs::metadata(&self.0)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }

    /// Children in name order; unreadable entries are skipped
    pub fn children(&self) -> io::Result<Vec<PathHandle>> {
        let mut children: Vec<PathHandle> = fs::read_dir(&self.0)?
            .filter_map(|entry| entry.ok())
            .map(|entry| PathHandle(entry.path()))
            .collect();
        children.sort();
        Ok(children)
    }

    /// First free sibling named `<stem> copy <n><ext>`
    pub fn duplicate(&self) -> PathHandle {
        let parent = self.parent().unwrap_or_else(|| self.clone());
        // directories keep dots in their names
        let (stem, extension) = if self.is_dir() {
            (self.basename(), None)
        } else {
            (
                self.0
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default(),
                self.0.extension().map(|e| e.to_string_lossy().to_string()),
            )
        };

        let mut n = 1;
        loop {
            let name = match &extension {
                Some(ext) => format!("{stem} copy {n}.{ext}"),
                None => format!("{stem} copy {n}"),
            };
            let candidate = parent.join(name);
            if !candidate.exists() && !candidate.is_symlink() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Deref for PathHandle {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for PathHandle {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl AsRef<OsStr> for PathHandle {
    fn as_ref(&self) -> &OsStr {
        self.0.as_os_str()
    }
}

impl fmt::Display for PathHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Why a path was refused by the sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escape {
    /// `..` components climb above the root
    Traversal,
    /// A symlink resolves somewhere outside the root
    Symlink,
}

/// Containment check for paths derived from request input.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathHandle,
    canonical_root: PathBuf,
}

impl Sandbox {
    pub fn new(root: PathHandle) -> io::Result<Self> {
        let canonical_root = root.canonicalize()?;
        Ok(Self {
            root,
            canonical_root,
        })
    }

    pub fn root(&self) -> &PathHandle {
        &self.root
    }

    /// Returns the lexically normalized handle when it is the root or below it.
    pub fn check(&self, path: &PathHandle) -> Result<PathHandle, Escape> {
        let normalized = normalize(path.as_path());
        if !normalized.starts_with(self.root.as_path()) {
            return Err(Escape::Traversal);
        }

        // Existing paths are judged by where they resolve, new ones by their
        // parent directory.
        let resolved = normalized.canonicalize().ok().or_else(|| {
            normalized
                .parent()
                .and_then(|p| p.canonicalize().ok())
                .zip(normalized.file_name())
                .map(|(parent, name)| parent.join(name))
        });

        match resolved {
            Some(real) if !real.starts_with(&self.canonical_root) => Err(Escape::Symlink),
            _ => Ok(PathHandle(normalized)),
        }
    }
}

// A backslash is an ordinary filename character outside Windows
#[cfg(windows)]
fn separators_to_slash(rel: String) -> String {
    rel.replace('\\', "/")
}

#[cfg(not(windows))]
fn separators_to_slash(rel: String) -> String {
    rel
}

/// Resolves `.` and `..` without consulting the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
