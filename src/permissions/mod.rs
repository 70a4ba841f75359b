// src/permissions/mod.rs
//!
//! Permission Module
//!
//! Capability sets and the rules that narrow them. Rules can only take
//! capabilities away; the resolver in [`resolver`] combines them with the
//! filesystem permission bits and the configured defaults.
//!

pub mod resolver;

#[cfg(test)]
mod tests;

use regex::Regex;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ConfigError;

pub use resolver::PermissionResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CapabilitySet {
    pub read: bool,
    pub write: bool,
    #[serde(rename = "rm")]
    pub remove: bool,
}

impl CapabilitySet {
    pub const ALL: CapabilitySet = CapabilitySet {
        read: true,
        write: true,
        remove: true,
    };

    pub const NONE: CapabilitySet = CapabilitySet {
        read: false,
        write: false,
        remove: false,
    };

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.read,
            Capability::Write => self.write,
            Capability::Remove => self.remove,
        }
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Write,
    Remove,
}

/// How a rule selects paths, tested against the root-relative string
#[derive(Debug, Clone)]
pub enum RulePattern {
    Exact(String),
    /// Unanchored search, like `str =~ /re/`
    Regex(Regex),
}

impl RulePattern {
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(RulePattern::Regex)
            .map_err(|e| ConfigError::InvalidRule {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn matches(&self, relative: &str) -> bool {
        match self {
            RulePattern::Exact(exact) => exact == relative,
            RulePattern::Regex(re) => re.is_match(relative),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RulePattern::Exact(exact) => exact,
            RulePattern::Regex(re) => re.as_str(),
        }
    }
}

/// A pattern plus the capabilities it revokes. `None` leaves a capability
/// alone, `Some(true)` is accepted but cannot re-grant anything.
#[derive(Debug, Clone)]
pub struct PermissionRule {
    pub pattern: RulePattern,
    pub read: Option<bool>,
    pub write: Option<bool>,
    pub remove: Option<bool>,
}

impl PermissionRule {
    pub fn new(pattern: RulePattern) -> Self {
        Self {
            pattern,
            read: None,
            write: None,
            remove: None,
        }
    }

    pub fn deny_read(mut self) -> Self {
        self.read = Some(false);
        self
    }

    pub fn deny_write(mut self) -> Self {
        self.write = Some(false);
        self
    }

    pub fn deny_remove(mut self) -> Self {
        self.remove = Some(false);
        self
    }

    pub fn denies(&self, capability: Capability) -> bool {
        let value = match capability {
            Capability::Read => self.read,
            Capability::Write => self.write,
            Capability::Remove => self.remove,
        };
        value == Some(false)
    }
}

/// Serialized form of a rule as it appears in configuration files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub pattern: String,
    #[serde(default)]
    pub regex: bool,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default)]
    pub write: Option<bool>,
    #[serde(default, rename = "rm")]
    pub remove: Option<bool>,
}

impl TryFrom<RuleSpec> for PermissionRule {
    type Error = ConfigError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        let pattern = if spec.regex {
            RulePattern::regex(&spec.pattern)?
        } else {
            RulePattern::Exact(spec.pattern)
        };
        Ok(PermissionRule {
            pattern,
            read: spec.read,
            write: spec.write,
            remove: spec.remove,
        })
    }
}
