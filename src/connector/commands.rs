// src/connector/commands.rs
//!
//! Command handlers
//!
//! Each handler either completes and fills the response, or returns a
//! [`ConnectorError`] before touching the filesystem any further. Handlers
//! that change the shape of the tree request a tree refresh on the implicit
//! re-open of the current directory.
//!

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{fs_ops, Exchange};
use crate::config::{render, Messages};
use crate::error::ConnectorError;
use crate::path::PathHandle;

impl<'a> Exchange<'a> {
    fn messages(&self) -> &'a Messages {
        &self.connector.config.i18n
    }

    fn missing(&self, parameter: &str) -> ConnectorError {
        let reason = format!("missing parameter '{parameter}'");
        ConnectorError::InvalidRequest {
            message: render(&self.messages().invalid_request, &[("reason", &reason)]),
            reason,
        }
    }

    fn access_denied(&self, path: &PathHandle) -> ConnectorError {
        ConnectorError::access_denied(path.to_string(), &self.messages().access_denied)
    }

    pub(super) fn not_implemented(&self) -> ConnectorError {
        ConnectorError::NotImplemented {
            command: self.command.to_string(),
            message: render(
                &self.messages().not_implemented,
                &[("cmd", self.command.as_str())],
            ),
        }
    }

    fn require_current(&self) -> Result<PathHandle, ConnectorError> {
        self.current.clone().ok_or_else(|| self.missing("current"))
    }

    fn require_target(&self) -> Result<PathHandle, ConnectorError> {
        self.target.clone().ok_or_else(|| self.missing("target"))
    }

    fn require_name(&self) -> Result<&'a str, ConnectorError> {
        self.request
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| self.missing("name"))
    }

    /// `dir/name`, confined to the sandbox. `name` must be a single plain
    /// component so the entry lands in `dir` and nowhere else.
    fn entry_in(&self, dir: &PathHandle, name: &str) -> Result<PathHandle, ConnectorError> {
        if Path::new(name).file_name() != Some(OsStr::new(name)) {
            warn!(dir = %dir, entry = name, "rejected entry name");
            let reason = format!("invalid name '{name}'");
            return Err(ConnectorError::InvalidRequest {
                message: render(&self.messages().invalid_request, &[("reason", &reason)]),
                reason,
            });
        }
        self.connector.confine(&dir.join(name))
    }

    fn can_write(&self, path: &PathHandle) -> bool {
        self.connector.permissions.resolve(path).write
    }

    fn can_create(&self, path: &PathHandle) -> bool {
        self.connector.permissions.can_create(path)
    }

    fn select(&mut self, paths: &[PathHandle]) {
        let ids = paths.iter().map(|p| self.connector.encode(p)).collect();
        self.response.select = Some(ids);
    }

    // ========================================================================
    // open
    // ========================================================================

    pub(super) fn open(&mut self) -> Result<(), ConnectorError> {
        let target = self.target.clone();
        self.open_path(target)
    }

    /// Renders `target` (root when absent) into cwd/cdc and the optional
    /// tree and init sections
    pub(super) fn open_path(&mut self, target: Option<PathHandle>) -> Result<(), ConnectorError> {
        let root = self.connector.root().clone();
        let target = target.unwrap_or_else(|| root.clone());

        if target.is_dir() {
            let builder = self.connector.response_builder();
            self.response.cwd = Some(builder.cwd(&target));
            self.response.cdc = Some(builder.children(&target));

            if self.tree {
                self.response.tree = Some(builder.root_tree());
            }

            if self.request.init {
                self.response.disabled = Some(self.connector.config.disabled_commands.clone());
                self.response.params = Some(builder.init_params());
            }
            Ok(())
        } else if target.is_file() {
            Err(self.not_implemented())
        } else if target == root {
            Err(ConnectorError::DoesNotExist {
                path: root.to_string(),
                message: self.messages().directory_missing.clone(),
            })
        } else {
            debug!(path = %target, "directory vanished, opening root");
            let missing = self.messages().directory_missing.clone();
            self.response.error.get_or_insert(missing);
            self.open_path(Some(root))
        }
    }

    // ========================================================================
    // mkdir / mkfile
    // ========================================================================

    pub(super) fn mkdir(&mut self) -> Result<(), ConnectorError> {
        let current = self.require_current()?;
        let dir = self.entry_in(&current, self.require_name()?)?;
        let message = &self.messages().mkdir_failed;

        if dir.exists() || dir.is_symlink() {
            return Err(ConnectorError::AlreadyExists {
                path: dir.to_string(),
                message: message.clone(),
            });
        }
        if !self.can_create(&dir) {
            return Err(self.access_denied(&current));
        }

        fs::create_dir(&dir).map_err(|e| ConnectorError::operation_failed(message, e))?;
        info!(path = %dir, "created directory");

        self.tree = true;
        self.select(&[dir]);
        self.open_path(Some(current))
    }

    pub(super) fn mkfile(&mut self) -> Result<(), ConnectorError> {
        let current = self.require_current()?;
        let file = self.entry_in(&current, self.require_name()?)?;
        let message = &self.messages().mkfile_failed;

        if file.exists() || file.is_symlink() {
            return Err(ConnectorError::AlreadyExists {
                path: file.to_string(),
                message: message.clone(),
            });
        }
        if !self.can_create(&file) {
            return Err(self.access_denied(&current));
        }

        fs_ops::touch(&file).map_err(|e| ConnectorError::operation_failed(message, e))?;
        info!(path = %file, "created file");

        self.select(&[file]);
        self.open_path(Some(current))
    }

    // ========================================================================
    // rename
    // ========================================================================

    pub(super) fn rename(&mut self) -> Result<(), ConnectorError> {
        let current = self.require_current()?;
        let target = self.require_target()?;
        let to = self.entry_in(&current, self.require_name()?)?;

        let caps = self.connector.permissions.resolve(&target);
        if !(caps.read && caps.write && caps.remove) {
            return Err(self.access_denied(&target));
        }
        if !self.can_create(&to) {
            return Err(self.access_denied(&to));
        }

        let ftype = target.ftype();
        if to.exists() || to.is_symlink() {
            return Err(ConnectorError::AlreadyExists {
                path: to.to_string(),
                message: render(
                    &self.messages().rename_exists,
                    &[("type", ftype), ("name", &to.basename())],
                ),
            });
        }

        fs::rename(&target, &to).map_err(|e| {
            ConnectorError::operation_failed(
                render(&self.messages().rename_failed, &[("type", ftype)]),
                e,
            )
        })?;
        info!(from = %target, to = %to, "renamed");

        self.tree = to.is_dir();
        self.select(&[to]);
        self.open_path(Some(current))
    }

    // ========================================================================
    // upload
    // ========================================================================

    pub(super) fn upload(&mut self) -> Result<(), ConnectorError> {
        let current = self.require_current()?;
        if !self.can_write(&current) {
            return Err(self.access_denied(&current));
        }

        let messages = self.messages();
        let limit = self.connector.upload_limit;
        let mut stored = Vec::new();

        for file in &self.request.upload {
            let Some(name) = (self.connector.config.original_filename)(file) else {
                let key = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.response.add_error_data(key, &messages.missing_filename);
                continue;
            };

            let dst = match self.entry_in(&current, &name) {
                Ok(dst) => dst,
                Err(e) => {
                    self.response.add_error_data(name, e.to_string());
                    continue;
                }
            };

            if dst.exists() || dst.is_symlink() {
                let dir = current.relative_to(self.connector.root());
                self.response
                    .add_error_data(name, render(&messages.paste_item_exists, &[("dir", &dir)]));
                continue;
            }

            if !self.can_create(&dst) {
                self.response.add_error_data(name, &messages.access_denied);
                continue;
            }

            let size = fs::metadata(&file.path).map(|m| m.len()).unwrap_or(0);
            if size > limit {
                let detail = render(
                    &messages.upload_too_large,
                    &[("limit", &self.connector.config.upload_max_size)],
                );
                self.response.add_error_data(name, detail);
                continue;
            }

            match fs_ops::move_path(&file.path, &dst) {
                Ok(()) => {
                    info!(path = %dst, size, "stored upload");
                    stored.push(dst);
                }
                Err(e) => self.response.add_error_data(name, e.to_string()),
            }
        }

        if self.response.error_data.is_some() {
            self.response.error = Some(messages.upload_failed.clone());
        }
        self.select(&stored);
        self.open_path(Some(current))
    }

    // ========================================================================
    // paste
    // ========================================================================

    pub(super) fn paste(&mut self) -> Result<(), ConnectorError> {
        let dst = self.dst.clone().ok_or_else(|| self.missing("dst"))?;
        let cut = self.request.cut > 0;
        let messages = self.messages();
        let root = self.connector.root().clone();

        for src in self.targets.clone() {
            let name = src.basename();
            let dest = match self.entry_in(&dst, &name) {
                Ok(dest) => dest,
                Err(e) => {
                    self.response.add_error_data(name, e.to_string());
                    continue;
                }
            };

            if dest.exists() || dest.is_symlink() {
                let dir = dst.relative_to(&root);
                self.response
                    .add_error_data(name, render(&messages.paste_item_exists, &[("dir", &dir)]));
                continue;
            }

            if lands_inside(&dst, &dest, &src) {
                self.response
                    .add_error_data(name, &messages.paste_into_itself);
                continue;
            }

            let caps = self.connector.permissions.resolve(&src);
            if !caps.read || (cut && !caps.remove) || !self.can_create(&dest) {
                self.response.add_error_data(name, &messages.access_denied);
                continue;
            }

            let result = if cut {
                fs_ops::move_path(&src, &dest)
            } else {
                fs_ops::copy_path(&src, &dest)
            };
            match result {
                Ok(()) => info!(from = %src, to = %dest, cut, "pasted"),
                Err(e) => self.response.add_error_data(name, e.to_string()),
            }
        }

        if self.response.error_data.is_some() {
            self.response.error = Some(messages.paste_failed.clone());
        }
        self.tree = true;
        let current = self.current.clone();
        self.open_path(current)
    }

    // ========================================================================
    // rm
    // ========================================================================

    pub(super) fn rm(&mut self) -> Result<(), ConnectorError> {
        if self.targets.is_empty() {
            return Err(ConnectorError::InvalidRequest {
                reason: "no targets".to_string(),
                message: self.messages().rm_empty.clone(),
            });
        }

        if let Some(denied) = self
            .targets
            .iter()
            .find(|target| !self.connector.permissions.resolve(target).remove)
        {
            return Err(self.access_denied(denied));
        }

        for target in &self.targets {
            fs_ops::remove_path(target).map_err(|e| {
                ConnectorError::operation_failed(
                    render(&self.messages().rm_failed, &[("name", &target.basename())]),
                    e,
                )
            })?;
            info!(path = %target, "removed");
        }

        self.tree = true;
        let current = self.current.clone();
        self.open_path(current)
    }

    // ========================================================================
    // duplicate
    // ========================================================================

    pub(super) fn duplicate(&mut self) -> Result<(), ConnectorError> {
        let target = self.require_target()?;
        if !self.connector.permissions.resolve(&target).read {
            return Err(self.access_denied(&target));
        }

        let duplicate = self.connector.confine(&target.duplicate())?;
        if !self.can_create(&duplicate) {
            return Err(self.access_denied(&duplicate));
        }

        fs_ops::copy_path(&target, &duplicate).map_err(|e| {
            ConnectorError::operation_failed(
                render(&self.messages().duplicate_failed, &[("type", target.ftype())]),
                e,
            )
        })?;
        info!(from = %target, to = %duplicate, "duplicated");

        self.tree = duplicate.is_dir();
        self.select(&[duplicate]);
        let current = self.current.clone();
        self.open_path(current)
    }

    // ========================================================================
    // read / edit
    // ========================================================================

    pub(super) fn read(&mut self) -> Result<(), ConnectorError> {
        let target = self.require_target()?;
        if !self.connector.permissions.resolve(&target).read {
            return Err(self.access_denied(&target));
        }

        let bytes = fs::read(&target).map_err(|e| {
            ConnectorError::operation_failed(&self.messages().read_failed, e)
        })?;
        let content = String::from_utf8(bytes).map_err(|e| {
            ConnectorError::operation_failed(
                &self.messages().read_failed,
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
        self.response.content = Some(content);
        Ok(())
    }

    pub(super) fn edit(&mut self) -> Result<(), ConnectorError> {
        let target = self.require_target()?;
        if !target.is_file() || !self.can_write(&target) {
            return Err(self.access_denied(&target));
        }

        let content = self.request.content.as_deref().unwrap_or_default();
        fs::write(&target, content).map_err(|e| {
            ConnectorError::operation_failed(&self.messages().edit_failed, e)
        })?;
        info!(path = %target, bytes = content.len(), "saved file");

        self.response.file = Some(self.connector.response_builder().child(&target));
        Ok(())
    }

    // ========================================================================
    // resize
    // ========================================================================

    pub(super) fn resize(&mut self) -> Result<(), ConnectorError> {
        let Some(resizer) = self.connector.config.image_resize_handler.clone() else {
            return Err(self.not_implemented());
        };

        let target = self.require_target()?;
        if !target.is_file() {
            return Err(ConnectorError::DoesNotExist {
                path: target.to_string(),
                message: self.messages().resize_missing.clone(),
            });
        }
        if !self.can_write(&target) {
            return Err(self.access_denied(&target));
        }

        let width = clamp_dimension(self.request.width);
        let height = clamp_dimension(self.request.height);
        resizer.resize(&target, width, height).map_err(|e| {
            ConnectorError::operation_failed(&self.messages().resize_failed, e)
        })?;
        info!(path = %target, width, height, "resized image");

        self.select(&[target]);
        let current = self.current.clone();
        self.open_path(current)
    }

    // ========================================================================
    // ping
    // ========================================================================

    pub(super) fn ping(&mut self) -> Result<(), ConnectorError> {
        self.headers
            .insert("Connection".to_string(), "Close".to_string());
        Ok(())
    }
}

fn clamp_dimension(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Whether `dest`, an entry of `dir`, lies inside `src`. Symlinks are
/// resolved so a destination reached through a link is caught as well.
fn lands_inside(dir: &PathHandle, dest: &PathHandle, src: &PathHandle) -> bool {
    if dest.starts_with(src) {
        return true;
    }
    match (dir.canonicalize(), src.canonicalize()) {
        (Ok(dir), Ok(src)) => dir.starts_with(src),
        _ => false,
    }
}
