// src/config/mod.rs
//!
//! Connector configuration
//!
//! [`ConnectorConfig::new`] supplies every default; `with_*` methods replace
//! individual values before the config is handed to [`crate::Connector::new`],
//! which takes ownership and never changes it afterwards.
//!

pub mod messages;


use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::connector::UploadedFile;
use crate::error::ConfigError;
use crate::handlers::{ImageResizer, ImageSizer, MimeGuessResolver, MimeResolver};
use crate::permissions::{CapabilitySet, PermissionRule, RuleSpec};

pub use messages::{render, Messages};

pub const DEFAULT_HOME: &str = "Home";
pub const DEFAULT_UPLOAD_MAX_SIZE: &str = "50M";

/// Picks the name an uploaded file is stored under
pub type OriginalFilenameFn = Arc<dyn Fn(&UploadedFile) -> Option<String> + Send + Sync>;

lazy_static::lazy_static! {
    static ref SIZE_LIMIT: Regex =
        Regex::new(r"^\s*(\d+)\s*([kKmMgG])?[bB]?\s*$").expect("size limit pattern is valid");
}

#[derive(Clone)]
pub struct ConnectorConfig {
    pub root: PathBuf,
    pub url: String,
    pub home: String,
    pub disabled_commands: Vec<String>,
    pub show_dot_files: bool,
    pub upload_max_size: String,
    pub archivers: Vec<String>,
    pub extractors: Vec<String>,
    pub default_perms: CapabilitySet,
    pub perms: Vec<PermissionRule>,
    pub i18n: Messages,
    pub mime_handler: Arc<dyn MimeResolver>,
    pub image_size_handler: Option<Arc<dyn ImageSizer>>,
    pub image_resize_handler: Option<Arc<dyn ImageResizer>>,
    pub original_filename: OriginalFilenameFn,
}

impl ConnectorConfig {
    pub fn new<P: Into<PathBuf>, U: Into<String>>(root: P, url: U) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
            home: DEFAULT_HOME.to_string(),
            disabled_commands: Vec::new(),
            show_dot_files: true,
            upload_max_size: DEFAULT_UPLOAD_MAX_SIZE.to_string(),
            archivers: Vec::new(),
            extractors: Vec::new(),
            default_perms: CapabilitySet::ALL,
            perms: Vec::new(),
            i18n: Messages::default(),
            mime_handler: Arc::new(MimeGuessResolver),
            image_size_handler: None,
            image_resize_handler: None,
            original_filename: Arc::new(|file: &UploadedFile| {
                Some(file.original_filename.clone()).filter(|name| !name.is_empty())
            }),
        }
    }

    /// Builds a config from JSON. `root` and `url` are required, everything
    /// else falls back to the defaults of [`ConnectorConfig::new`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        file.into_config()
    }

    pub fn with_home<S: Into<String>>(mut self, home: S) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_disabled_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_show_dot_files(mut self, show: bool) -> Self {
        self.show_dot_files = show;
        self
    }

    pub fn with_upload_max_size<S: Into<String>>(mut self, limit: S) -> Self {
        self.upload_max_size = limit.into();
        self
    }

    pub fn with_archivers(mut self, archivers: Vec<String>) -> Self {
        self.archivers = archivers;
        self
    }

    pub fn with_extractors(mut self, extractors: Vec<String>) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_default_perms(mut self, perms: CapabilitySet) -> Self {
        self.default_perms = perms;
        self
    }

    pub fn with_rule(mut self, rule: PermissionRule) -> Self {
        self.perms.push(rule);
        self
    }

    pub fn with_messages(mut self, messages: Messages) -> Self {
        self.i18n = messages;
        self
    }

    pub fn with_mime_handler(mut self, handler: Arc<dyn MimeResolver>) -> Self {
        self.mime_handler = handler;
        self
    }

    pub fn with_image_size_handler(mut self, handler: Arc<dyn ImageSizer>) -> Self {
        self.image_size_handler = Some(handler);
        self
    }

    pub fn with_image_resize_handler(mut self, handler: Arc<dyn ImageResizer>) -> Self {
        self.image_resize_handler = Some(handler);
        self
    }

    pub fn with_original_filename(mut self, extract: OriginalFilenameFn) -> Self {
        self.original_filename = extract;
        self
    }

    pub fn is_disabled(&self, command: &str) -> bool {
        self.disabled_commands.iter().any(|c| c == command)
    }

    /// Image metadata is only reported when both image handlers are present
    pub fn image_handlers(&self) -> Option<(&dyn ImageSizer, &dyn ImageResizer)> {
        match (&self.image_size_handler, &self.image_resize_handler) {
            (Some(sizer), Some(resizer)) => Some((sizer.as_ref(), resizer.as_ref())),
            _ => None,
        }
    }

    /// Upload limit in bytes
    pub fn upload_limit_bytes(&self) -> Result<u64, ConfigError> {
        parse_size(&self.upload_max_size)
    }

    /// Checks everything that cannot be expressed in the types
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::MissingOption { option: "root" });
        }
        if self.url.is_empty() {
            return Err(ConfigError::MissingOption { option: "url" });
        }

        let meta = std::fs::metadata(&self.root).map_err(|e| ConfigError::InvalidRoot {
            path: self.root.display().to_string(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(ConfigError::InvalidRoot {
                path: self.root.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        self.upload_limit_bytes()?;
        Ok(())
    }
}

impl fmt::Debug for ConnectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectorConfig")
            .field("root", &self.root)
            .field("url", &self.url)
            .field("home", &self.home)
            .field("disabled_commands", &self.disabled_commands)
            .field("show_dot_files", &self.show_dot_files)
            .field("upload_max_size", &self.upload_max_size)
            .field("default_perms", &self.default_perms)
            .field("perms", &self.perms.len())
            .field("image_size_handler", &self.image_size_handler.is_some())
            .field("image_resize_handler", &self.image_resize_handler.is_some())
            .finish()
    }
}

/// Parses limits such as `50M`, `512k` or `1048576` into bytes
pub fn parse_size(value: &str) -> Result<u64, ConfigError> {
    let invalid = || ConfigError::InvalidUploadLimit {
        value: value.to_string(),
    };

    let caps = SIZE_LIMIT.captures(value).ok_or_else(invalid)?;
    let amount: u64 = caps[1].parse().map_err(|_| invalid())?;
    let multiplier: u64 = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        None => 1,
        Some(unit) if unit == "K" => 1 << 10,
        Some(unit) if unit == "M" => 1 << 20,
        Some(_) => 1 << 30,
    };
    amount.checked_mul(multiplier).ok_or_else(invalid)
}

/// On-disk configuration layout
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ConfigFile {
    root: Option<PathBuf>,
    url: Option<String>,
    home: Option<String>,
    disabled_commands: Vec<String>,
    show_dot_files: Option<bool>,
    upload_max_size: Option<String>,
    archivers: Vec<String>,
    extractors: Vec<String>,
    default_perms: Option<CapabilitySet>,
    perms: Vec<RuleSpec>,
    i18n: Option<Messages>,
}

impl ConfigFile {
    fn into_config(self) -> Result<ConnectorConfig, ConfigError> {
        let root = self
            .root
            .ok_or(ConfigError::MissingOption { option: "root" })?;
        let url = self.url.ok_or(ConfigError::MissingOption { option: "url" })?;

        let mut config = ConnectorConfig::new(root, url)
            .with_disabled_commands(self.disabled_commands)
            .with_archivers(self.archivers)
            .with_extractors(self.extractors);

        if let Some(home) = self.home {
            config = config.with_home(home);
        }
        if let Some(show) = self.show_dot_files {
            config = config.with_show_dot_files(show);
        }
        if let Some(limit) = self.upload_max_size {
            config = config.with_upload_max_size(limit);
        }
        if let Some(perms) = self.default_perms {
            config = config.with_default_perms(perms);
        }
        if let Some(messages) = self.i18n {
            config = config.with_messages(messages);
        }
        for spec in self.perms {
            config = config.with_rule(PermissionRule::try_from(spec)?);
        }

        Ok(config)
    }
}
