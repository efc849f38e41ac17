//! Commands and the factory that builds them from request bodies.
//!
//! A [`Command`] is the only thing the dispatch layer ever sees. It is built
//! after the credential gate has let the request through, and it carries a
//! JSON object payload:
//!
//! | Command       | Payload                                         |
//! |---------------|-------------------------------------------------|
//! | `listDaemons` | `{}`                                            |
//! | `scheduleJob` | `{"daemonTarget", "version"?, "parameters"}`    |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::endpoint::FeatureEndpoint;
use crate::version::is_valid_optional_version;

/// A command payload: always a JSON object.
pub type Payload = serde_json::Map<String, Value>;

/// The closed set of command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandName {
    ListDaemons,
    ScheduleJob,
}

impl CommandName {
    pub const ALL: [CommandName; 2] = [CommandName::ListDaemons, CommandName::ScheduleJob];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandName::ListDaemons => "listDaemons",
            CommandName::ScheduleJob => "scheduleJob",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named request for the dispatch layer. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    name: CommandName,
    payload: Payload,
}

impl Command {
    pub fn new(name: CommandName, payload: Payload) -> Self {
        Self { name, payload }
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

/// The payload of a `scheduleJob` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub daemon_target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub parameters: Payload,
}

impl JobRequest {
    pub fn new(daemon_target: impl Into<String>) -> Self {
        Self {
            daemon_target: daemon_target.into(),
            version: None,
            parameters: Payload::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Read a job request back out of a `scheduleJob` payload.
    pub fn from_payload(payload: &Payload) -> Result<Self, ValidationError> {
        serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|e| ValidationError::malformed("body", e.to_string()))
    }

    pub fn into_payload(self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("daemonTarget".to_string(), Value::String(self.daemon_target));
        if let Some(version) = self.version {
            payload.insert("version".to_string(), Value::String(version));
        }
        payload.insert("parameters".to_string(), Value::Object(self.parameters));
        payload
    }
}

/// Why a request body could not become a command. Surfaces as HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid version {value}")]
    InvalidVersion { value: String },

    #[error("malformed payload: {field} {reason}")]
    MalformedPayload { field: String, reason: String },
}

impl ValidationError {
    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::MalformedPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::InvalidVersion { .. } => "invalid_version",
            ValidationError::MalformedPayload { .. } => "malformed_payload",
        }
    }

    /// The request field at fault.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::InvalidVersion { .. } => "version",
            ValidationError::MalformedPayload { field, .. } => field,
        }
    }
}

/// Turns an authenticated request into a [`Command`].
///
/// Implementations must be pure: no I/O, no shared mutable state.
pub trait CommandFactory: Send + Sync {
    fn build(&self, endpoint: FeatureEndpoint, body: &[u8]) -> Result<Command, ValidationError>;
}

/// The factory used by the feature endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureCommandFactory;

impl CommandFactory for FeatureCommandFactory {
    fn build(&self, endpoint: FeatureEndpoint, body: &[u8]) -> Result<Command, ValidationError> {
        match endpoint {
            FeatureEndpoint::ListDaemons => Ok(Command::new(CommandName::ListDaemons, Payload::new())),
            FeatureEndpoint::ScheduleJob => {
                let request = parse_job_request(body)?;
                Ok(Command::new(CommandName::ScheduleJob, request.into_payload()))
            }
        }
    }
}

/// Field-by-field so each failure names the field at fault. Unknown
/// top-level fields are dropped.
fn parse_job_request(body: &[u8]) -> Result<JobRequest, ValidationError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ValidationError::malformed("body", format!("is not valid JSON: {e}")))?;
    let Value::Object(mut object) = value else {
        return Err(ValidationError::malformed("body", "must be a JSON object"));
    };

    let daemon_target = match object.remove("daemonTarget") {
        Some(Value::String(target)) if !target.is_empty() => target,
        Some(Value::String(_)) => {
            return Err(ValidationError::malformed("daemonTarget", "must not be empty"));
        }
        Some(_) => return Err(ValidationError::malformed("daemonTarget", "must be a string")),
        None => return Err(ValidationError::malformed("daemonTarget", "is required")),
    };

    // An empty version is the same as no version.
    let version = match object.remove("version") {
        None | Some(Value::Null) => None,
        Some(Value::String(version)) => {
            if !is_valid_optional_version(Some(&version)) {
                return Err(ValidationError::InvalidVersion {
                    value: format!("{version:?}"),
                });
            }
            Some(version).filter(|v| !v.is_empty())
        }
        Some(other) => {
            return Err(ValidationError::InvalidVersion {
                value: other.to_string(),
            });
        }
    };

    let parameters = match object.remove("parameters") {
        None | Some(Value::Null) => Payload::new(),
        Some(Value::Object(parameters)) => parameters,
        Some(_) => return Err(ValidationError::malformed("parameters", "must be a JSON object")),
    };

    Ok(JobRequest {
        daemon_target,
        version,
        parameters,
    })
}
