#![deny(unsafe_code)]

//! jobgate core: credential-gated feature endpoints and command dispatch.
//!
//! A request to a feature endpoint runs an explicit pipeline:
//!
//! ```text
//! CredentialGate::authenticate → CommandFactory::build → CommandDispatcher::dispatch
//! ```
//!
//! Each stage returns a `Result` and the first failure short-circuits into an
//! HTTP error. The feature routes only exist when configuration enables them;
//! see [`http::FeatureRegistrar`].

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async trait
/// methods consumed through `dyn Trait`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// HTTP Basic credential gate.
pub mod auth;
/// Build metadata (version, git hash, profile).
pub mod build_info;
/// Commands, job requests and the command factory.
pub mod command;
/// Daemon descriptors and the roster handler.
pub mod daemon;
/// Command dispatcher and handler trait.
pub mod dispatch;
/// Feature endpoint identities.
pub mod endpoint;
/// Route table, feature registrar and response types.
pub mod http;
/// Scheduled-job envelopes and the job forwarder.
pub mod job;
/// HTTP server runtime.
pub mod server;
/// Optional version-string grammar.
pub mod version;

pub use auth::{AuthError, CredentialGate, Credentials};
pub use command::{
    Command, CommandFactory, CommandName, FeatureCommandFactory, JobRequest, Payload,
    ValidationError,
};
pub use daemon::{DaemonDescriptor, DaemonRoster, DaemonStatus};
pub use dispatch::{CommandDispatcher, CommandHandler, DispatchError, HandlerError};
pub use endpoint::FeatureEndpoint;
pub use http::{FeatureRegistrar, MAX_BODY_BYTES, Registration, RouteError, RouteTable};
pub use job::{JobAccepted, JobForwarder, ScheduledJob};
pub use server::{Server, ServerError, ShutdownSignal};
pub use version::is_valid_optional_version;
