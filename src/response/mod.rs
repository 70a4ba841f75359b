// src/response/mod.rs
//!
//! Response payload types
//!
//! Field names follow the widget protocol (`cwd`, `cdc`, `errorData`, ...).
//! Every optional section is omitted from the serialized form when unset.
//!

pub mod builder;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use serde::Serialize;
use ts_rs::TS;

use crate::permissions::CapabilitySet;

pub use builder::ResponseBuilder;

/// Transport headers, e.g. `Connection: Close` on ping
pub type Headers = BTreeMap<String, String>;

/// Descriptor of the directory being viewed
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CwdDescriptor {
    pub name: String,
    pub hash: String,
    pub mime: String,
    /// Home label followed by the root-relative path
    pub rel: String,
    pub size: u64,
    pub date: String,
    #[serde(flatten)]
    pub perms: CapabilitySet,
}

/// Descriptor of a single directory entry
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescriptor {
    pub name: String,
    pub hash: String,
    pub date: String,
    #[serde(flatten)]
    pub perms: CapabilitySet,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub mime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub resize: Option<bool>,
    /// Image dimensions as `WxH`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub link_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TreeNode {
    pub name: String,
    pub hash: String,
    pub dirs: Vec<TreeNode>,
    #[serde(flatten)]
    pub perms: CapabilitySet,
}

/// Configuration echoed to the client on an `init` open
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InitParams {
    pub dot_files: bool,
    pub upl_max_size: String,
    pub archives: Vec<String>,
    pub extract: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub cwd: Option<CwdDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub cdc: Option<Vec<NodeDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub tree: Option<TreeNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub select: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error_data: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub disabled: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub params: Option<InitParams>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub file: Option<NodeDescriptor>,
}

impl Response {
    /// Records a per-item failure, keyed by the item's name
    pub fn add_error_data<K: Into<String>, V: Into<String>>(&mut self, item: K, detail: V) {
        self.error_data
            .get_or_insert_with(BTreeMap::new)
            .insert(item.into(), detail.into());
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
