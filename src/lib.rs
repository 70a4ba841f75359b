//! Server-side connector for a browser file-manager widget.
//!
//! A [`Connector`] is built once from a [`ConnectorConfig`] and then handles
//! one [`Request`] at a time against a sandboxed directory tree, answering
//! with transport headers and a serializable [`Response`].

pub mod config;
pub mod connector;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod path;
pub mod permissions;
pub mod response;

pub use config::{ConnectorConfig, Messages};
pub use connector::{Command, Connector, Request, UploadedFile};
pub use error::{ConfigError, ConnectorError, ConnectorErrorCode};
pub use handlers::{Dimensions, ImageResizer, ImageSizer, MimeGuessResolver, MimeResolver};
pub use path::{DecodeError, PathCodec, PathHandle};
pub use permissions::{CapabilitySet, PermissionResolver, PermissionRule, RulePattern};
pub use response::{Headers, Response};
