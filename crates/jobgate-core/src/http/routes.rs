//! Named route table over an axum [`Router`].
//!
//! axum panics when two handlers claim the same method and path. The table
//! checks names and method+path pairs up front and reports a
//! [`RouteError::Conflict`] instead, so startup wiring fails cleanly.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::http::Method;
use axum::routing::MethodRouter;

use crate::auth::CredentialGate;

/// What a named route is mounted on.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    /// Gate evaluated before the handler, if the route is guarded.
    pub gate: Option<Arc<CredentialGate>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route {name} conflicts with an existing registration: {reason}")]
    Conflict { name: String, reason: String },

    #[error("route {name} cannot be guarded: {reason}")]
    InvalidGate { name: String, reason: String },
}

impl RouteError {
    pub(crate) fn conflict(name: &str, reason: impl Into<String>) -> Self {
        RouteError::Conflict {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_gate(name: &str, reason: impl Into<String>) -> Self {
        RouteError::InvalidGate {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// The process-wide route table.
///
/// Written during startup registration, then frozen by
/// [`into_router`](Self::into_router).
#[derive(Default)]
pub struct RouteTable {
    router: Router,
    routes: BTreeMap<String, RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `name` or `method path` is already taken.
    pub fn check_free(&self, name: &str, method: &Method, path: &str) -> Result<(), RouteError> {
        if self.routes.contains_key(name) {
            return Err(RouteError::conflict(name, "name already registered"));
        }
        if let Some((owner, _)) = self
            .routes
            .iter()
            .find(|(_, entry)| entry.method == *method && entry.path == path)
        {
            return Err(RouteError::conflict(
                name,
                format!("{method} {path} is already served by {owner}"),
            ));
        }
        Ok(())
    }

    /// Mount `handler` under `name`.
    pub fn add(
        &mut self,
        name: &str,
        method: Method,
        path: &str,
        gate: Option<Arc<CredentialGate>>,
        handler: MethodRouter,
    ) -> Result<(), RouteError> {
        self.check_free(name, &method, path)?;

        self.router = std::mem::take(&mut self.router).route(path, handler);
        self.routes.insert(
            name.to_string(),
            RouteEntry {
                method,
                path: path.to_string(),
                gate,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Registered routes, ordered by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.routes.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}
