//! Spy and stub implementations of the pipeline traits.
//!
//! [`RecordingHandler`] and [`SpyFactory`] count how often they are reached,
//! which is how tests prove that a rejected request never got past the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use jobgate_core::{
    BoxFuture, Command, CommandFactory, CommandHandler, FeatureCommandFactory, FeatureEndpoint,
    HandlerError, Payload, ValidationError,
};

/// Handler that records every payload it receives.
///
/// Returns the configured response, or echoes the payload back as a JSON
/// object when none is set.
#[derive(Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<Payload>>,
    response: Option<Value>,
}

impl RecordingHandler {
    /// A handler echoing its payload.
    pub fn echo() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A handler always returning `response`.
    pub fn returning(response: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            response: Some(response),
        })
    }

    pub fn calls(&self) -> Vec<Payload> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl CommandHandler for RecordingHandler {
    fn handle<'a>(&'a self, payload: &'a Payload) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(payload.clone());
            }
            let value = self
                .response
                .clone()
                .unwrap_or_else(|| Value::Object(payload.clone()));
            Ok::<_, HandlerError>(value)
        })
    }
}

/// Handler that always fails with the given message.
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    pub fn new(message: &str) -> Arc<Self> {
        Arc::new(Self {
            message: message.to_string(),
        })
    }
}

impl CommandHandler for FailingHandler {
    fn handle<'a>(&'a self, _payload: &'a Payload) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move { Err::<Value, HandlerError>(self.message.clone().into()) })
    }
}

/// [`FeatureCommandFactory`] wrapper that counts `build` calls.
#[derive(Default)]
pub struct SpyFactory {
    builds: AtomicUsize,
}

impl SpyFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl CommandFactory for SpyFactory {
    fn build(&self, endpoint: FeatureEndpoint, body: &[u8]) -> Result<Command, ValidationError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        FeatureCommandFactory.build(endpoint, body)
    }
}
