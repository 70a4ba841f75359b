// src/error.rs
use thiserror::Error;
use ts_rs::TS;

use crate::path::codec::DecodeError;

/// Error codes for frontend handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, TS)]
#[ts(export)]
pub enum ConnectorErrorCode {
    InvalidCommand = 1000,
    InvalidRequest = 1001,
    AccessDenied = 1002,
    AlreadyExists = 2000,
    DoesNotExist = 2001,
    NotImplemented = 3000,
    OperationFailed = 4000,
}

impl serde::Serialize for ConnectorErrorCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(*self as u16)
    }
}

/// Failures raised while handling a single request.
///
/// None of these escape [`crate::Connector::run`]: the dispatcher renders them
/// into the `error` field of the response. The `message` fields already hold
/// the localized text from [`crate::config::Messages`].
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("{message}")]
    InvalidCommand { command: String, message: String },

    #[error("{message}")]
    InvalidRequest { reason: String, message: String },

    #[error("{message}")]
    AccessDenied { path: String, message: String },

    #[error("{message}")]
    AlreadyExists { path: String, message: String },

    #[error("{message}")]
    DoesNotExist { path: String, message: String },

    #[error("{message}")]
    NotImplemented { command: String, message: String },

    #[error("{message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl ConnectorError {
    /// Get error code for this error
    pub fn code(&self) -> ConnectorErrorCode {
        match self {
            ConnectorError::InvalidCommand { .. } => ConnectorErrorCode::InvalidCommand,
            ConnectorError::InvalidRequest { .. } => ConnectorErrorCode::InvalidRequest,
            ConnectorError::AccessDenied { .. } => ConnectorErrorCode::AccessDenied,
            ConnectorError::AlreadyExists { .. } => ConnectorErrorCode::AlreadyExists,
            ConnectorError::DoesNotExist { .. } => ConnectorErrorCode::DoesNotExist,
            ConnectorError::NotImplemented { .. } => ConnectorErrorCode::NotImplemented,
            ConnectorError::OperationFailed { .. } => ConnectorErrorCode::OperationFailed,
        }
    }

    pub fn access_denied<P: Into<String>>(path: P, message: &str) -> Self {
        Self::AccessDenied {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn operation_failed<M: Into<String>>(message: M, source: std::io::Error) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn is_permission_error(&self) -> bool {
        matches!(self, ConnectorError::AccessDenied { .. })
    }

    /// Builds an invalid-request error from a codec failure
    pub fn from_decode(err: &DecodeError, message: String) -> Self {
        Self::InvalidRequest {
            reason: err.to_string(),
            message,
        }
    }
}

impl serde::Serialize for ConnectorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ConnectorError", 3)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("type", &format!("{:?}", self.code()))?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Fatal configuration problems, raised only while building a connector.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required :{option} option")]
    MissingOption { option: &'static str },

    #[error("Root '{path}' is not a usable directory: {reason}")]
    InvalidRoot { path: String, reason: String },

    #[error("Invalid permission rule '{pattern}': {reason}")]
    InvalidRule { pattern: String, reason: String },

    #[error("Invalid upload size limit '{value}'")]
    InvalidUploadLimit { value: String },

    #[error("Failed to parse configuration: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },
}
