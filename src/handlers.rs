// src/handlers.rs
//!
//! External collaborators
//!
//! The connector never inspects file contents itself. MIME detection, image
//! measurement and image resizing are delegated to these single-method
//! traits so hosts can plug in whatever tooling they have.
//!

use std::fmt;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Resolves the MIME type of a regular file
pub trait MimeResolver: Send + Sync {
    fn mime(&self, path: &Path) -> String;
}

/// Measures an image
pub trait ImageSizer: Send + Sync {
    fn dimensions(&self, path: &Path) -> Option<Dimensions>;
}

/// Resizes an image in place
pub trait ImageResizer: Send + Sync {
    fn resize(&self, path: &Path, width: u32, height: u32) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Rendered as `WxH`, the form the widget displays
impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Extension based detection backed by `mime_guess`
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeGuessResolver;

impl MimeResolver for MimeGuessResolver {
    fn mime(&self, path: &Path) -> String {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
    }
}

/// True for `image/*` types
pub fn is_image(mime_type: &str) -> bool {
    mime_type
        .parse::<mime::Mime>()
        .map(|m| m.type_() == mime::IMAGE)
        .unwrap_or(false)
}
