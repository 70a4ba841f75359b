// src/permissions/resolver.rs
// Capability resolution for paths under the sandbox root

use tracing::trace;

use super::{Capability, CapabilitySet, PermissionRule};
use crate::path::PathHandle;

/// Computes the effective capabilities of a path.
///
/// Nothing is cached: every call stats the path and re-evaluates the rules,
/// so the result always reflects the filesystem at the time of the request.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    root: PathHandle,
    defaults: CapabilitySet,
    rules: Vec<PermissionRule>,
}

impl PermissionResolver {
    pub fn new(root: PathHandle, defaults: CapabilitySet, rules: Vec<PermissionRule>) -> Self {
        Self {
            root,
            defaults,
            rules,
        }
    }

    /// # Resolution Rules
    /// 1. A missing path can be neither read nor written
    /// 2. read = readable && no rule denies read && default read
    /// 3. write = writable && no rule denies write && default write
    /// 4. remove = not root && write && no rule denies remove && default remove
    /// 5. For regular files write and remove collapse to `write && remove`
    pub fn resolve(&self, path: &PathHandle) -> CapabilitySet {
        let exists = path.exists();
        let relative = path.relative_to(&self.root);

        let read = exists
            && path.is_readable()
            && self.rules_allow(&relative, Capability::Read)
            && self.defaults.read;

        let write = exists
            && path.is_writable()
            && self.rules_allow(&relative, Capability::Write)
            && self.defaults.write;

        let remove = *path != self.root
            && write
            && self.rules_allow(&relative, Capability::Remove)
            && self.defaults.remove;

        let mut caps = CapabilitySet {
            read,
            write,
            remove,
        };

        // Either capability lets the holder destroy the current content
        if path.is_file() {
            let coupled = caps.write && caps.remove;
            caps.write = coupled;
            caps.remove = coupled;
        }

        trace!(path = %relative, ?caps, "resolved capabilities");
        caps
    }

    /// True when no rule matching `relative` revokes `capability`
    pub fn rules_allow(&self, relative: &str, capability: Capability) -> bool {
        !self
            .rules
            .iter()
            .filter(|rule| rule.pattern.matches(relative))
            .any(|rule| rule.denies(capability))
    }

    /// Whether `path` may be written as a destination. An existing path needs
    /// its own write capability; a new one needs a writable parent and no rule
    /// denying writes to the new path.
    pub fn can_create(&self, path: &PathHandle) -> bool {
        if path.exists() || path.is_symlink() {
            return self.resolve(path).write;
        }
        let Some(parent) = path.parent() else {
            return false;
        };
        self.resolve(&parent).write
            && self.rules_allow(&path.relative_to(&self.root), Capability::Write)
            && self.defaults.write
    }

    pub fn root(&self) -> &PathHandle {
        &self.root
    }
}
