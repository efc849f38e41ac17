//! Feature endpoint registrar and the per-request pipeline.
//!
//! The registrar mounts `GET /feature` and `POST /feature` only when the
//! feature settings are present and enabled. Each route carries its own
//! [`CredentialGate`], its [`CommandFactory`] and the shared
//! [`CommandDispatcher`]; nothing is resolved from global state.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodRouter, get, post};
use tracing::{debug, error, info};

use jobgate_config::FeatureSettings;

use super::routes::{RouteError, RouteTable};
use super::types::ErrorResponse;
use crate::auth::{AuthError, CredentialGate};
use crate::command::{CommandFactory, ValidationError};
use crate::dispatch::{CommandDispatcher, DispatchError};
use crate::endpoint::FeatureEndpoint;

/// Largest request body a feature route will read, in bytes.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Outcome of [`FeatureRegistrar::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Settings absent or disabled; nothing was mounted.
    Disabled,
    /// Both feature routes were mounted.
    Registered,
    /// Both routes were already mounted with the same credentials.
    Unchanged,
}

/// Mounts the feature endpoints on a [`RouteTable`].
#[derive(Clone)]
pub struct FeatureRegistrar {
    factory: Arc<dyn CommandFactory>,
    dispatcher: Arc<CommandDispatcher>,
}

impl FeatureRegistrar {
    pub fn new(factory: Arc<dyn CommandFactory>, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            factory,
            dispatcher,
        }
    }

    /// Register the feature routes if `settings` enables them.
    ///
    /// Registering again with the same credentials is a no-op
    /// ([`Registration::Unchanged`]). Different credentials, or a table where
    /// the names or `/feature` methods belong to other routes, is a
    /// [`RouteError::Conflict`] and leaves the table untouched.
    pub fn register(
        &self,
        table: &mut RouteTable,
        settings: Option<&FeatureSettings>,
    ) -> Result<Registration, RouteError> {
        let Some(settings) = settings.filter(|s| s.enabled) else {
            debug!("feature daemons disabled, {} not registered", FeatureEndpoint::PATH);
            return Ok(Registration::Disabled);
        };

        if settings.user.is_empty() || settings.user.contains(':') {
            return Err(RouteError::invalid_gate(
                FeatureEndpoint::PATH,
                "feature user must be non-empty and must not contain ':'",
            ));
        }
        let gate = Arc::new(CredentialGate::from_settings(settings));

        if let Some(registration) = Self::existing_registration(table, &gate)? {
            return Ok(registration);
        }
        for endpoint in FeatureEndpoint::ALL {
            table.check_free(endpoint.route_name(), &endpoint.method(), FeatureEndpoint::PATH)?;
        }

        for endpoint in FeatureEndpoint::ALL {
            let route = FeatureRoute {
                endpoint,
                gate: Arc::clone(&gate),
                factory: Arc::clone(&self.factory),
                dispatcher: Arc::clone(&self.dispatcher),
            };
            let handler: MethodRouter<FeatureRoute> = match endpoint {
                FeatureEndpoint::ListDaemons => get(handle_feature),
                FeatureEndpoint::ScheduleJob => post(handle_feature),
            };
            table.add(
                endpoint.route_name(),
                endpoint.method(),
                FeatureEndpoint::PATH,
                Some(Arc::clone(&gate)),
                handler.with_state(route),
            )?;
            info!(
                route = endpoint.route_name(),
                method = %endpoint.method(),
                path = FeatureEndpoint::PATH,
                "feature route registered"
            );
        }

        Ok(Registration::Registered)
    }

    /// `Some(Unchanged)` if an identical registration is already in place,
    /// `None` if neither route exists yet.
    fn existing_registration(
        table: &RouteTable,
        gate: &CredentialGate,
    ) -> Result<Option<Registration>, RouteError> {
        let mut present = 0;
        for endpoint in FeatureEndpoint::ALL {
            let name = endpoint.route_name();
            let Some(entry) = table.get(name) else {
                continue;
            };
            present += 1;

            if entry.method != endpoint.method() || entry.path != FeatureEndpoint::PATH {
                return Err(RouteError::conflict(
                    name,
                    format!("already bound to {} {}", entry.method, entry.path),
                ));
            }
            let same = entry
                .gate
                .as_deref()
                .is_some_and(|existing| existing.same_credentials(gate));
            if !same {
                return Err(RouteError::conflict(
                    name,
                    "already registered with different credentials",
                ));
            }
        }

        match present {
            0 => Ok(None),
            n if n == FeatureEndpoint::ALL.len() => {
                debug!("feature routes already registered with identical settings");
                Ok(Some(Registration::Unchanged))
            }
            _ => Err(RouteError::conflict(
                FeatureEndpoint::PATH,
                "feature routes are only partially registered",
            )),
        }
    }
}

/// Everything one feature route needs to serve a request.
#[derive(Clone)]
struct FeatureRoute {
    endpoint: FeatureEndpoint,
    gate: Arc<CredentialGate>,
    factory: Arc<dyn CommandFactory>,
    dispatcher: Arc<CommandDispatcher>,
}

impl FeatureRoute {
    /// authenticate → read body → build → dispatch; the first failure wins.
    ///
    /// The body stays unread until the gate has passed.
    async fn run(&self, headers: &HeaderMap, body: Body) -> Result<Response, FeatureError> {
        self.gate.authenticate(headers)?;
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES).await.map_err(|_| {
            ValidationError::malformed(
                "body",
                format!("could not be read or exceeds {MAX_BODY_BYTES} bytes"),
            )
        })?;
        let command = self.factory.build(self.endpoint, &body)?;
        let result = self.dispatcher.dispatch(command).await?;
        Ok((self.endpoint.success_status(), Json(result)).into_response())
    }

    fn error_response(&self, err: FeatureError) -> Response {
        let route = self.endpoint.route_name();
        match err {
            FeatureError::Auth(reason) => {
                debug!(route, %reason, "request rejected by credential gate");
                let mut resp = (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("unauthorized")),
                )
                    .into_response();
                if let Ok(challenge) = HeaderValue::from_str(&self.gate.challenge()) {
                    resp.headers_mut().insert(WWW_AUTHENTICATE, challenge);
                }
                resp
            }
            FeatureError::Validation(reason) => {
                debug!(route, %reason, "request failed validation");
                let body = ErrorResponse {
                    error: reason.code().to_string(),
                    field: Some(reason.field().to_string()),
                    message: Some(reason.to_string()),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            FeatureError::Dispatch(reason) => {
                // UnknownCommand is already logged by the dispatcher.
                if let DispatchError::HandlerFailed(cause) = &reason {
                    error!(route, %cause, "command handler failed");
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("internal_error")),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum FeatureError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

// `Body` is the raw stream; axum's buffering extractors would read it before
// the gate runs.
async fn handle_feature(
    State(route): State<FeatureRoute>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    match route.run(&headers, body).await {
        Ok(resp) => resp,
        Err(err) => route.error_response(err),
    }
}
