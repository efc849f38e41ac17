//! Daemon descriptors and the roster handler behind `listDaemons`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use jobgate_config::RosterEntryConfig;

use crate::BoxFuture;
use crate::command::Payload;
use crate::dispatch::{CommandHandler, HandlerError};

/// Availability of a daemon as reported by the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonStatus {
    Idle,
    Busy,
    Offline,
}

impl DaemonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DaemonStatus::Idle => "idle",
            DaemonStatus::Busy => "busy",
            DaemonStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for DaemonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown daemon status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for DaemonStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(DaemonStatus::Idle),
            "busy" => Ok(DaemonStatus::Busy),
            "offline" => Ok(DaemonStatus::Offline),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One entry in the `listDaemons` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonDescriptor {
    pub identifier: String,
    pub status: DaemonStatus,
}

impl DaemonDescriptor {
    pub fn new(identifier: impl Into<String>, status: DaemonStatus) -> Self {
        Self {
            identifier: identifier.into(),
            status,
        }
    }
}

/// `listDaemons` handler reporting a fixed set of daemons.
#[derive(Debug, Clone, Default)]
pub struct DaemonRoster {
    daemons: Vec<DaemonDescriptor>,
}

impl DaemonRoster {
    pub fn new(daemons: Vec<DaemonDescriptor>) -> Self {
        Self { daemons }
    }

    /// Build the roster from `[[daemons.roster]]` entries.
    pub fn from_config(entries: &[RosterEntryConfig]) -> Result<Self, UnknownStatus> {
        let daemons = entries
            .iter()
            .map(|entry| {
                Ok(DaemonDescriptor::new(
                    entry.identifier.clone(),
                    entry.status.parse()?,
                ))
            })
            .collect::<Result<Vec<_>, UnknownStatus>>()?;
        Ok(Self { daemons })
    }

    pub fn daemons(&self) -> &[DaemonDescriptor] {
        &self.daemons
    }
}

impl CommandHandler for DaemonRoster {
    fn handle<'a>(&'a self, _payload: &'a Payload) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let listing = serde_json::to_value(&self.daemons)?;
            Ok::<_, HandlerError>(listing)
        })
    }
}
