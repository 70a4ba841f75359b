// src/connector/request.rs
// Incoming request shape and the closed set of commands

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Archive,
    Duplicate,
    Edit,
    Extract,
    Mkdir,
    Mkfile,
    Open,
    Paste,
    Ping,
    Read,
    Rename,
    Resize,
    Rm,
    Tmb,
    Upload,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::Archive,
        Command::Duplicate,
        Command::Edit,
        Command::Extract,
        Command::Mkdir,
        Command::Mkfile,
        Command::Open,
        Command::Paste,
        Command::Ping,
        Command::Read,
        Command::Rename,
        Command::Resize,
        Command::Rm,
        Command::Tmb,
        Command::Upload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Archive => "archive",
            Command::Duplicate => "duplicate",
            Command::Edit => "edit",
            Command::Extract => "extract",
            Command::Mkdir => "mkdir",
            Command::Mkfile => "mkfile",
            Command::Open => "open",
            Command::Paste => "paste",
            Command::Ping => "ping",
            Command::Read => "read",
            Command::Rename => "rename",
            Command::Resize => "resize",
            Command::Rm => "rm",
            Command::Tmb => "tmb",
            Command::Upload => "upload",
        }
    }

    /// Commands that answer with a directory listing, also after a failure
    pub fn renders_view(&self) -> bool {
        matches!(
            self,
            Command::Mkdir
                | Command::Mkfile
                | Command::Rename
                | Command::Upload
                | Command::Paste
                | Command::Rm
                | Command::Duplicate
                | Command::Resize
        )
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the host has already received into a temporary location
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Temporary location of the received bytes
    pub path: PathBuf,
    /// Name the client sent the file under
    #[serde(default)]
    pub original_filename: String,
}

impl UploadedFile {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, original_filename: S) -> Self {
        Self {
            path: path.into(),
            original_filename: original_filename.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Request {
    pub cmd: String,
    pub current: Option<String>,
    pub target: Option<String>,
    pub targets: Option<Vec<String>>,
    pub name: Option<String>,
    pub content: Option<String>,
    pub dst: Option<String>,
    #[serde(deserialize_with = "loose_int")]
    pub cut: i64,
    #[serde(deserialize_with = "loose_int")]
    pub width: i64,
    #[serde(deserialize_with = "loose_int")]
    pub height: i64,
    #[serde(deserialize_with = "loose_bool")]
    pub tree: bool,
    #[serde(deserialize_with = "loose_bool")]
    pub init: bool,
    pub upload: Vec<UploadedFile>,
}

impl Request {
    pub fn new<S: Into<String>>(cmd: S) -> Self {
        Self {
            cmd: cmd.into(),
            ..Default::default()
        }
    }

    pub fn with_current<S: Into<String>>(mut self, current: S) -> Self {
        self.current = Some(current.into());
        self
    }

    pub fn with_target<S: Into<String>>(mut self, target: S) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = Some(targets.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content<S: Into<String>>(mut self, content: S) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_dst<S: Into<String>>(mut self, dst: S) -> Self {
        self.dst = Some(dst.into());
        self
    }

    pub fn with_cut(mut self, cut: bool) -> Self {
        self.cut = i64::from(cut);
        self
    }

    pub fn with_size(mut self, width: i64, height: i64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_tree(mut self) -> Self {
        self.tree = true;
        self
    }

    pub fn with_init(mut self) -> Self {
        self.init = true;
        self
    }

    pub fn with_upload(mut self, file: UploadedFile) -> Self {
        self.upload.push(file);
        self
    }
}

/// Form transports send flags and numbers as strings
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Loose {
    /// Integer value with string-to-int semantics: leading digits, else 0
    fn to_int(&self) -> i64 {
        match self {
            Loose::Bool(b) => i64::from(*b),
            Loose::Int(i) => *i,
            Loose::Float(f) => *f as i64,
            Loose::Str(s) => {
                let s = s.trim();
                let end = s
                    .char_indices()
                    .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
                    .map(|(i, _)| i)
                    .unwrap_or(s.len());
                s[..end].parse().unwrap_or(0)
            }
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Loose::Bool(b) => *b,
            Loose::Str(s) => {
                let s = s.trim();
                !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
            }
            other => other.to_int() != 0,
        }
    }
}

fn loose_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_int()).unwrap_or(0))
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(value.map(|v| v.to_bool()).unwrap_or(false))
}
