// src/path/codec.rs
//!
//! Opaque path identifiers
//!
//! Identifiers carry the root-relative component of a path. The current
//! format is `v1_` followed by the URL-safe, unpadded base64 of that component.
//! Identifiers without a version prefix are read as the legacy format
//! (standard base64), which older widget builds stored in their selections.
//!

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine,
};
use thiserror::Error;

use super::PathHandle;

/// Component that stands for the root itself
pub const ROOT_MARKER: &str = "/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Identifier is empty")]
    Empty,

    #[error("Unsupported identifier version '{version}'")]
    UnsupportedVersion { version: String },

    #[error("Identifier is not valid base64: {reason}")]
    InvalidEncoding { reason: String },

    #[error("Identifier does not decode to UTF-8 text")]
    InvalidUtf8,

    #[error("Identifier contains a NUL byte")]
    NulByte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecVersion {
    /// Standard base64 without prefix
    Legacy,
    V1,
}

impl CodecVersion {
    fn prefix(self) -> &'static str {
        match self {
            CodecVersion::Legacy => "",
            CodecVersion::V1 => "v1_",
        }
    }
}

/// Bidirectional mapping between handles under `root` and identifiers.
#[derive(Debug, Clone)]
pub struct PathCodec {
    root: PathHandle,
    version: CodecVersion,
}

impl PathCodec {
    pub fn new(root: PathHandle) -> Self {
        Self {
            root,
            version: CodecVersion::V1,
        }
    }

    /// Codec that emits identifiers in an explicit format version
    pub fn with_version(root: PathHandle, version: CodecVersion) -> Self {
        Self { root, version }
    }

    pub fn root(&self) -> &PathHandle {
        &self.root
    }

    pub fn encode(&self, path: &PathHandle) -> String {
        let component = if *path == self.root {
            ROOT_MARKER.to_string()
        } else {
            path.relative_to(&self.root)
        };

        match self.version {
            CodecVersion::Legacy => STANDARD.encode(component.as_bytes()),
            CodecVersion::V1 => format!(
                "{}{}",
                CodecVersion::V1.prefix(),
                URL_SAFE_NO_PAD.encode(component.as_bytes())
            ),
        }
    }

    /// Decodes an identifier into a handle joined onto the root.
    ///
    /// The result is NOT guaranteed to stay inside the root; callers must run
    /// it through [`super::Sandbox::check`] before touching the filesystem.
    pub fn decode(&self, identifier: &str) -> Result<PathHandle, DecodeError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(DecodeError::Empty);
        }

        let bytes = match identifier.split_once('_') {
            Some((version, payload)) if is_version_tag(version) => {
                if version != "v1" {
                    return Err(DecodeError::UnsupportedVersion {
                        version: version.to_string(),
                    });
                }
                URL_SAFE_NO_PAD.decode(payload)
            }
            // legacy encoders wrapped long output every 60 characters
            _ => STANDARD.decode(identifier.replace(['\n', '\r'], "")),
        }
        .map_err(|e| DecodeError::InvalidEncoding {
            reason: e.to_string(),
        })?;

        let component = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        if component.contains('\0') {
            return Err(DecodeError::NulByte);
        }

        if component == ROOT_MARKER {
            return Ok(self.root.clone());
        }

        Ok(self.root.join(component.trim_start_matches('/')))
    }
}

/// `v` followed by digits; never produced by standard base64 followed by `_`
fn is_version_tag(tag: &str) -> bool {
    tag.len() > 1 && tag.starts_with('v') && tag[1..].chars().all(|c| c.is_ascii_digit())
}
