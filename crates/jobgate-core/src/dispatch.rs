//! Command dispatcher: typed routing from a [`Command`] to its handler.
//!
//! The dispatcher neither retries, queues nor schedules. Handlers are the
//! boundary to whatever execution backend sits behind them, and their result
//! is returned to the caller unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::BoxFuture;
use crate::command::{Command, CommandName, Payload};

/// Opaque failure from a command handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Executes (or forwards) one kind of command.
pub trait CommandHandler: Send + Sync {
    fn handle<'a>(&'a self, payload: &'a Payload) -> BoxFuture<'a, Result<Value, HandlerError>>;
}

/// Errors from [`CommandDispatcher::dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No handler was registered: a wiring defect, not a client error.
    #[error("no handler registered for command {0}")]
    UnknownCommand(CommandName),

    #[error("command handler failed: {0}")]
    HandlerFailed(#[source] HandlerError),
}

/// Registry mapping each [`CommandName`] to its handler.
///
/// Built once at startup and shared read-only behind an `Arc`.
#[derive(Default)]
pub struct CommandDispatcher {
    handlers: HashMap<CommandName, Arc<dyn CommandHandler>>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`, returning any handler it replaces.
    pub fn register(
        &mut self,
        name: CommandName,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.insert(name, handler)
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_handler(mut self, name: CommandName, handler: Arc<dyn CommandHandler>) -> Self {
        self.register(name, handler);
        self
    }

    pub fn handles(&self, name: CommandName) -> bool {
        self.handlers.contains_key(&name)
    }

    /// Commands without a handler. Empty for a fully wired dispatcher.
    pub fn missing(&self) -> Vec<CommandName> {
        CommandName::ALL
            .into_iter()
            .filter(|name| !self.handles(*name))
            .collect()
    }

    /// Hand `command` to its handler and return the handler's result.
    pub async fn dispatch(&self, command: Command) -> Result<Value, DispatchError> {
        let name = command.name();
        let Some(handler) = self.handlers.get(&name) else {
            error!(command = %name, "no handler registered, dispatcher is miswired");
            return Err(DispatchError::UnknownCommand(name));
        };

        debug!(command = %name, "dispatching command");
        handler
            .handle(command.payload())
            .await
            .map_err(DispatchError::HandlerFailed)
    }
}
