// src/connector/mod.rs
//!
//! Connector
//!
//! Entry point of the crate. [`Connector::run`] decodes the identifiers of a
//! request, checks them against the sandbox, dispatches the command to its
//! handler and returns the response together with transport headers.
//!
//! Handlers report failures as [`ConnectorError`]; the dispatcher turns them
//! into the `error` field and, for commands that normally answer with a
//! listing, re-renders the current directory so the client view stays
//! consistent. Nothing but [`ConfigError`] (from [`Connector::new`]) ever
//! escapes to the caller.
//!
//! Requests share no mutable state. Concurrent requests touching the same
//! paths are not serialized here and rely on the filesystem's own atomicity.
//!

mod commands;
pub mod fs_ops;
pub mod request;


use tracing::{debug, warn};

use crate::config::{render, ConnectorConfig};
use crate::error::{ConfigError, ConnectorError};
use crate::path::{normalize, DecodeError, PathCodec, PathHandle, Sandbox};
use crate::permissions::PermissionResolver;
use crate::response::{Headers, Response, ResponseBuilder};

pub use request::{Command, Request, UploadedFile};

pub struct Connector {
    config: ConnectorConfig,
    sandbox: Sandbox,
    codec: PathCodec,
    permissions: PermissionResolver,
    upload_limit: u64,
}

impl Connector {
    /// Validates the configuration and fixes the sandbox root.
    pub fn new(config: ConnectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let upload_limit = config.upload_limit_bytes()?;

        let root_path = if config.root.is_absolute() {
            normalize(&config.root)
        } else {
            config
                .root
                .canonicalize()
                .map_err(|e| ConfigError::InvalidRoot {
                    path: config.root.display().to_string(),
                    reason: e.to_string(),
                })?
        };
        let root = PathHandle::new(root_path);

        let sandbox = Sandbox::new(root.clone()).map_err(|e| ConfigError::InvalidRoot {
            path: root.to_string(),
            reason: e.to_string(),
        })?;
        let codec = PathCodec::new(root.clone());
        let permissions =
            PermissionResolver::new(root.clone(), config.default_perms, config.perms.clone());

        debug!(root = %root, url = %config.url, "connector ready");

        Ok(Self {
            config,
            sandbox,
            codec,
            permissions,
            upload_limit,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn root(&self) -> &PathHandle {
        self.sandbox.root()
    }

    pub fn encode(&self, path: &PathHandle) -> String {
        self.codec.encode(path)
    }

    pub fn decode(&self, identifier: &str) -> Result<PathHandle, DecodeError> {
        self.codec.decode(identifier)
    }

    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }

    pub fn response_builder(&self) -> ResponseBuilder<'_> {
        ResponseBuilder::new(&self.config, &self.codec, &self.permissions)
    }

    /// Handles one request. Never fails: every problem ends up in
    /// `Response::error`.
    pub fn run(&self, request: &Request) -> (Headers, Response) {
        let messages = &self.config.i18n;

        let command = match request.cmd.parse::<Command>() {
            Ok(command) if !self.config.is_disabled(command.as_str()) => command,
            _ => {
                let e = ConnectorError::InvalidCommand {
                    command: request.cmd.clone(),
                    message: render(&messages.invalid_command, &[("cmd", &request.cmd)]),
                };
                warn!(cmd = %request.cmd, code = ?e.code(), "rejected command");
                let response = Response {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
                return (Headers::new(), response);
            }
        };

        debug!(%command, "handling request");

        let mut exchange = match Exchange::prepare(self, request, command) {
            Ok(exchange) => exchange,
            Err(e) => {
                warn!(%command, error = %e, "invalid request");
                let response = Response {
                    error: Some(e.to_string()),
                    ..Default::default()
                };
                return (Headers::new(), response);
            }
        };

        if let Err(e) = exchange.dispatch() {
            warn!(%command, code = ?e.code(), error = %e, "command failed");
            exchange.response.error = Some(e.to_string());

            if command.renders_view() && exchange.response.cwd.is_none() {
                let current = exchange.current.clone();
                if let Err(e) = exchange.open_path(current) {
                    warn!(%command, error = %e, "failed to render directory after error");
                }
            }
        }

        (exchange.headers, exchange.response)
    }

    /// Decodes an identifier and confines it to the sandbox
    fn resolve_identifier(&self, identifier: &str) -> Result<PathHandle, ConnectorError> {
        let messages = &self.config.i18n;
        let decoded = self.codec.decode(identifier).map_err(|e| {
            let message = render(&messages.invalid_request, &[("reason", &e.to_string())]);
            ConnectorError::from_decode(&e, message)
        })?;
        self.confine(&decoded)
    }

    /// Rejects paths outside the root
    fn confine(&self, path: &PathHandle) -> Result<PathHandle, ConnectorError> {
        self.sandbox.check(path).map_err(|escape| {
            warn!(path = %path, ?escape, "path outside sandbox");
            let reason = "path is outside the root directory";
            ConnectorError::InvalidRequest {
                reason: reason.to_string(),
                message: render(&self.config.i18n.invalid_request, &[("reason", reason)]),
            }
        })
    }
}

/// State of one request while it is being handled
pub(crate) struct Exchange<'a> {
    connector: &'a Connector,
    request: &'a Request,
    command: Command,
    current: Option<PathHandle>,
    target: Option<PathHandle>,
    targets: Vec<PathHandle>,
    dst: Option<PathHandle>,
    /// Include the directory tree in the next rendered listing
    tree: bool,
    headers: Headers,
    response: Response,
}

impl<'a> Exchange<'a> {
    fn prepare(
        connector: &'a Connector,
        request: &'a Request,
        command: Command,
    ) -> Result<Self, ConnectorError> {
        let decode = |id: &Option<String>| -> Result<Option<PathHandle>, ConnectorError> {
            id.as_deref()
                .map(|id| connector.resolve_identifier(id))
                .transpose()
        };

        let targets = request
            .targets
            .iter()
            .flatten()
            .map(|id| connector.resolve_identifier(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            connector,
            request,
            command,
            current: decode(&request.current)?,
            target: decode(&request.target)?,
            targets,
            dst: decode(&request.dst)?,
            tree: request.tree,
            headers: Headers::new(),
            response: Response::default(),
        })
    }

    fn dispatch(&mut self) -> Result<(), ConnectorError> {
        match self.command {
            Command::Open => self.open(),
            Command::Mkdir => self.mkdir(),
            Command::Mkfile => self.mkfile(),
            Command::Rename => self.rename(),
            Command::Upload => self.upload(),
            Command::Paste => self.paste(),
            Command::Rm => self.rm(),
            Command::Duplicate => self.duplicate(),
            Command::Read => self.read(),
            Command::Edit => self.edit(),
            Command::Resize => self.resize(),
            Command::Ping => self.ping(),
            Command::Extract | Command::Archive | Command::Tmb => Err(self.not_implemented()),
        }
    }
}
