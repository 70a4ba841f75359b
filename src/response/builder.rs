// src/response/builder.rs
// Descriptor construction for directories, entries and the directory tree

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::{CwdDescriptor, InitParams, NodeDescriptor, TreeNode};
use crate::config::ConnectorConfig;
use crate::handlers::is_image;
use crate::path::{PathCodec, PathHandle};
use crate::permissions::PermissionResolver;

pub const DIRECTORY_MIME: &str = "directory";

/// Borrowed view over the connector's collaborators, built per request
pub struct ResponseBuilder<'a> {
    config: &'a ConnectorConfig,
    codec: &'a PathCodec,
    permissions: &'a PermissionResolver,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(
        config: &'a ConnectorConfig,
        codec: &'a PathCodec,
        permissions: &'a PermissionResolver,
    ) -> Self {
        Self {
            config,
            codec,
            permissions,
        }
    }

    fn root(&self) -> &PathHandle {
        self.codec.root()
    }

    pub fn cwd(&self, path: &PathHandle) -> CwdDescriptor {
        let rel = if path == self.root() {
            self.config.home.clone()
        } else {
            format!("{}/{}", self.config.home, path.relative_to(self.root()))
        };

        CwdDescriptor {
            name: path.basename(),
            hash: self.codec.encode(path),
            mime: DIRECTORY_MIME.to_string(),
            rel,
            size: 0,
            date: format_date(path.modified()),
            perms: self.permissions.resolve(path),
        }
    }

    pub fn child(&self, path: &PathHandle) -> NodeDescriptor {
        let mut descriptor = NodeDescriptor {
            name: path.basename(),
            hash: self.codec.encode(path),
            date: format_date(path.modified()),
            perms: self.permissions.resolve(path),
            mime: None,
            size: None,
            url: None,
            resize: None,
            dim: None,
            link: None,
            link_to: None,
            parent: None,
        };

        if path.is_dir() {
            descriptor.size = Some(0);
            descriptor.mime = Some(DIRECTORY_MIME.to_string());
        } else if path.is_symlink() {
            self.describe_link(path, &mut descriptor);
        } else if path.is_file() {
            let mime_type = self.config.mime_handler.mime(path);
            descriptor.size = Some(path.size());
            descriptor.url = Some(self.public_url(path));

            if is_image(&mime_type) {
                if let Some((sizer, _)) = self.config.image_handlers() {
                    descriptor.resize = Some(true);
                    descriptor.dim = sizer.dimensions(path).map(|d| d.to_string());
                }
            }
            descriptor.mime = Some(mime_type);
        }

        descriptor
    }

    /// Fills link fields for a symlink whose target is a file or is dangling.
    /// Targets outside the root are described without pointing at them.
    fn describe_link(&self, path: &PathHandle, descriptor: &mut NodeDescriptor) {
        let Ok(target) = path.canonicalize() else {
            debug!(path = %path, "dangling symlink");
            return;
        };
        let Ok(root) = self.root().canonicalize() else {
            return;
        };
        let Ok(relative) = target.strip_prefix(&root) else {
            debug!(path = %path, "symlink target outside root");
            return;
        };

        let target = self.root().join(relative);
        descriptor.link = Some(self.codec.encode(&target));
        descriptor.link_to = Some(format!(
            "{}/{}",
            self.config.home,
            target.relative_to(self.root())
        ));
        descriptor.parent = target.parent().map(|p| self.codec.encode(&p));
        descriptor.mime = Some(self.config.mime_handler.mime(&target));
        descriptor.size = Some(target.size());
    }

    /// Immediate children of a directory, honoring the dot-file setting
    pub fn children(&self, path: &PathHandle) -> Vec<NodeDescriptor> {
        self.visible_children(path)
            .iter()
            .map(|child| self.child(child))
            .collect()
    }

    /// The whole directory hierarchy under the root, labelled with the home name
    pub fn root_tree(&self) -> TreeNode {
        let root = self.root().clone();
        TreeNode {
            name: self.config.home.clone(),
            hash: self.codec.encode(&root),
            dirs: self.tree(&root),
            perms: self.permissions.resolve(&root),
        }
    }

    /// Directory children only, sorted case-insensitively, recursively.
    /// Directories resolving outside the root are left out.
    pub fn tree(&self, path: &PathHandle) -> Vec<TreeNode> {
        let Ok(root) = self.root().canonicalize() else {
            warn!(root = %self.root(), "failed to resolve root");
            return Vec::new();
        };
        let mut ancestors = HashSet::new();
        if let Ok(real) = path.canonicalize() {
            ancestors.insert(real);
        }
        self.subtree(path, &root, &mut ancestors)
    }

    fn subtree(
        &self,
        path: &PathHandle,
        root: &Path,
        ancestors: &mut HashSet<PathBuf>,
    ) -> Vec<TreeNode> {
        let mut dirs: Vec<(PathHandle, io::Result<PathBuf>)> = self
            .visible_children(path)
            .into_iter()
            .filter(|child| child.is_dir())
            .map(|dir| {
                let real = dir.canonicalize();
                (dir, real)
            })
            .filter(|(dir, real)| match real {
                Ok(real) if !real.starts_with(root) => {
                    debug!(path = %dir, "directory resolves outside root, left out of tree");
                    false
                }
                _ => true,
            })
            .collect();
        dirs.sort_by_key(|(dir, _)| dir.basename().to_lowercase());

        dirs.into_iter()
            .map(|(dir, real)| {
                // a symlinked directory pointing back up the walk is a cycle
                let children = match real {
                    Ok(real) if ancestors.insert(real.clone()) => {
                        let children = self.subtree(&dir, root, ancestors);
                        ancestors.remove(&real);
                        children
                    }
                    Ok(_) => {
                        warn!(path = %dir, "directory cycle detected, not descending");
                        Vec::new()
                    }
                    Err(e) => {
                        warn!(path = %dir, error = %e, "failed to resolve directory");
                        Vec::new()
                    }
                };

                TreeNode {
                    name: dir.basename(),
                    hash: self.codec.encode(&dir),
                    dirs: children,
                    perms: self.permissions.resolve(&dir),
                }
            })
            .collect()
    }

    pub fn init_params(&self) -> InitParams {
        InitParams {
            dot_files: self.config.show_dot_files,
            upl_max_size: self.config.upload_max_size.clone(),
            archives: self.config.archivers.clone(),
            extract: self.config.extractors.clone(),
            url: self.config.url.clone(),
        }
    }

    fn public_url(&self, path: &PathHandle) -> String {
        format!(
            "{}/{}",
            self.config.url.trim_end_matches('/'),
            path.relative_to(self.root())
        )
    }

    fn visible_children(&self, path: &PathHandle) -> Vec<PathHandle> {
        let children = match path.children() {
            Ok(children) => children,
            Err(e) => {
                warn!(path = %path, error = %e, "failed to list directory");
                return Vec::new();
            }
        };

        children
            .into_iter()
            .filter(|child| {
                if !child.has_utf8_name() {
                    warn!(path = %child.display(), "name is not valid UTF-8, skipping");
                    return false;
                }
                self.config.show_dot_files || !child.basename().starts_with('.')
            })
            .collect()
    }
}

/// `YYYY-MM-DD HH:MM:SS +0000`, empty when the time is unknown
pub fn format_date(time: Option<SystemTime>) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] +0000");
    time.map(OffsetDateTime::from)
        .and_then(|t| t.format(&format).ok())
        .unwrap_or_default()
}
