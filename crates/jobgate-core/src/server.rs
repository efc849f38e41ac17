//! HTTP server runtime: wiring, startup and graceful shutdown.

use std::sync::{Arc, Mutex};

use axum::Json;
use axum::http::Method;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use jobgate_config::AppConfig;

use crate::command::{CommandName, FeatureCommandFactory};
use crate::daemon::{DaemonRoster, UnknownStatus};
use crate::dispatch::CommandDispatcher;
use crate::http::{FeatureRegistrar, HealthResponse, RouteError, RouteTable};
use crate::job::{JobForwarder, ScheduledJob};

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// The jobgate HTTP server.
pub struct Server {
    config: AppConfig,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    _shutdown_rx: broadcast::Receiver<ShutdownSignal>,
    // Held here until the execution backend takes it; jobs queue up (to
    // `bus_capacity`) in the meantime.
    job_rx: Mutex<Option<mpsc::Receiver<ScheduledJob>>>,
    dispatcher: Arc<CommandDispatcher>,
}

impl Server {
    /// Build the dispatcher and job queue for `config`.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        let (job_tx, job_rx) = mpsc::channel(config.daemons.bus_capacity);

        let roster = DaemonRoster::from_config(&config.daemons.roster)?;
        let dispatcher = CommandDispatcher::new()
            .with_handler(CommandName::ListDaemons, Arc::new(roster))
            .with_handler(CommandName::ScheduleJob, Arc::new(JobForwarder::new(job_tx)));

        Ok(Self {
            config,
            shutdown_tx,
            _shutdown_rx,
            job_rx: Mutex::new(Some(job_rx)),
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Build the route table: `/health` always, the feature routes when
    /// `daemons.feature` is on.
    pub fn route_table(&self) -> Result<RouteTable, RouteError> {
        let mut table = RouteTable::new();
        table.add("health", Method::GET, "/health", None, get(handle_health))?;

        let registrar =
            FeatureRegistrar::new(Arc::new(FeatureCommandFactory), Arc::clone(&self.dispatcher));
        registrar.register(&mut table, self.config.feature_settings().as_ref())?;
        Ok(table)
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> Result<(), ServerError> {
        let addr = format!(
            "{}:{}",
            self.config.server.listen_addr, self.config.server.listen_port
        );
        let listener = TcpListener::bind(&addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until a [`ShutdownSignal`] is
    /// broadcast or Ctrl-C arrives.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let table = self.route_table()?;
        info!(
            addr = %listener.local_addr()?,
            routes = ?table.names().collect::<Vec<_>>(),
            "jobgate server listening"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let shutdown_tx = self.shutdown_tx.clone();
        axum::serve(listener, table.into_router())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Shutdown signal received, stopping server");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        warn!("Ctrl-C received, initiating graceful shutdown");
                        let _ = shutdown_tx.send(ShutdownSignal);
                    }
                }
            })
            .await?;

        info!("Server stopped");
        Ok(())
    }

    /// Request a graceful shutdown of the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    /// Take the receiving end of the job queue. This is the execution
    /// backend's inlet; only the first call gets it.
    pub fn take_job_receiver(&self) -> Option<mpsc::Receiver<ScheduledJob>> {
        self.job_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    pub fn dispatcher(&self) -> Arc<CommandDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Errors from the server runtime.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("route registration failed: {0}")]
    Route(#[from] RouteError),

    #[error("invalid daemon roster: {0}")]
    Roster(#[from] UnknownStatus),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::build_info::VERSION.to_string(),
        git_hash: crate::build_info::GIT_HASH.to_string(),
    })
}
