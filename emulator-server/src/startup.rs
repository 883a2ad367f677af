//! Server startup and lifecycle

use crate::error::ServerError;
use crate::state::AppState;
use axum::Router;
use emulator_config::EmulatorConfig;
use emulator_core::Protocol;
use futures::future::try_join_all;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Build the configuration files are expected to be generated for
pub const BUILD_ID: Option<&str> = option_env!("EMULATOR_BUILD_ID");

/// Compare the configured build with the running one, warning on mismatch
pub fn build_id_matches(config: &EmulatorConfig, build_id: Option<&str>) -> bool {
    match (config.build_id.as_deref(), build_id) {
        (Some(expected), Some(running)) if expected != running => {
            warn!(
                "Configuration was generated for build {} but this is build {}",
                expected, running
            );
            false
        }
        _ => true,
    }
}

/// The emulated service
pub struct Server {
    config: EmulatorConfig,
    state: AppState,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: EmulatorConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the HTTP application
    pub fn build_http_app(&self) -> Router {
        crate::http::router(self.state.clone())
    }

    /// Build the gRPC application
    pub fn build_grpc_app(&self) -> Router {
        crate::grpc::router(self.state.clone())
    }

    /// Protocols with a listener: the service protocol and every endpoint protocol
    pub fn listener_protocols(&self) -> Vec<Protocol> {
        [Protocol::Http, Protocol::Grpc]
            .into_iter()
            .filter(|protocol| {
                self.config.protocol == *protocol
                    || self
                        .config
                        .endpoints
                        .iter()
                        .any(|endpoint| endpoint.protocol == *protocol)
            })
            .collect()
    }

    /// Bind the listeners without serving yet
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let mut bound = BoundServer {
            http: None,
            grpc: None,
        };

        for protocol in self.listener_protocols() {
            match protocol {
                Protocol::Http => {
                    let listener = bind(&self.config.server.http_addr()).await?;
                    bound.http = Some((listener, self.build_http_app()));
                }
                Protocol::Grpc => {
                    let listener = bind(&self.config.server.grpc_addr()).await?;
                    bound.grpc = Some((listener, self.build_grpc_app()));
                }
            }
        }

        Ok(bound)
    }

    /// Start the server and serve until SIGINT or SIGTERM
    pub async fn start(self) -> Result<(), ServerError> {
        self.log_config_summary();

        let bound = self.bind().await?;
        bound.serve(shutdown_signal()).await?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Log configuration summary
    fn log_config_summary(&self) {
        let config = &self.config;
        info!("=== Emulator Configuration ===");
        info!("Service: {} ({})", config.service_name, config.protocol);
        info!("Processes: {}", config.processes);
        info!("Endpoints: {}", config.endpoints.len());
        for endpoint in &config.endpoints {
            info!(
                "  {} [{}, {}] -> {} downstream routes",
                endpoint.name,
                endpoint.protocol,
                endpoint.execution_mode,
                endpoint.called_services().len()
            );
        }
        info!(
            "CPU strategy: {:?} (lock threads: {})",
            config.execution.cpu_strategy, config.execution.lock_threads
        );
        let breakers = self.state.engine().network().forwarder().breakers();
        info!("Circuit breakers: {}", breakers.len());
        for route in breakers.routes() {
            info!("  {}", route);
        }
        info!("Request tracing: {}", if config.logging { "Enabled" } else { "Disabled" });
        info!("==============================");
    }
}

async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Listeners bound and ready to serve
pub struct BoundServer {
    http: Option<(TcpListener, Router)>,
    grpc: Option<(TcpListener, Router)>,
}

impl BoundServer {
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http
            .as_ref()
            .and_then(|(listener, _)| listener.local_addr().ok())
    }

    pub fn grpc_addr(&self) -> Option<SocketAddr> {
        self.grpc
            .as_ref()
            .and_then(|(listener, _)| listener.local_addr().ok())
    }

    /// Serve every bound listener until `shutdown` resolves, then drain them
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let (notify, _) = watch::channel(false);

        let listeners = [("HTTP", self.http), ("gRPC", self.grpc)]
            .into_iter()
            .filter_map(|(name, bound)| bound.map(|(listener, app)| (name, listener, app)))
            .map(|(name, listener, app)| serve_listener(name, listener, app, notify.subscribe()));

        let serving = try_join_all(listeners);
        tokio::pin!(serving);

        tokio::select! {
            result = &mut serving => return result.map(|_| ()),
            _ = shutdown => {
                info!("Shutdown signal received, draining connections");
                let _ = notify.send(true);
            }
        }

        serving.await.map(|_| ())
    }
}

async fn serve_listener(
    name: &'static str,
    listener: TcpListener,
    app: Router,
    mut signal: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!("{} listener on {}", name, addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = signal.changed().await;
        })
        .await
        .map_err(|e| {
            error!("{} listener failed: {}", name, e);
            ServerError::Serve(e)
        })
}

/// Resolve on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emulator_core::EndpointDefinition;

    fn config(protocol: Protocol, endpoints: Vec<EndpointDefinition>) -> EmulatorConfig {
        let mut config = EmulatorConfig {
            service_name: "svcA".to_string(),
            protocol,
            logging: false,
            endpoints,
            ..Default::default()
        };
        config.server.bind_address = "127.0.0.1".to_string();
        config.server.http_port = 0;
        config.server.grpc_port = 0;
        config
    }

    #[test]
    fn test_build_id_mismatch_is_reported() {
        let mut config = EmulatorConfig::default();
        assert!(build_id_matches(&config, Some("abc")));

        config.build_id = Some("abc".to_string());
        assert!(build_id_matches(&config, Some("abc")));
        assert!(build_id_matches(&config, None));
        assert!(!build_id_matches(&config, Some("def")));
    }

    #[test]
    fn test_listener_protocols() {
        let http_only = Server::new(config(
            Protocol::Http,
            vec![EndpointDefinition::new("ep1")],
        ))
        .unwrap();
        assert_eq!(http_only.listener_protocols(), vec![Protocol::Http]);

        let mixed = Server::new(config(
            Protocol::Http,
            vec![EndpointDefinition::new("ep1").with_protocol(Protocol::Grpc)],
        ))
        .unwrap();
        assert_eq!(mixed.listener_protocols(), vec![Protocol::Http, Protocol::Grpc]);
    }

    #[tokio::test]
    async fn test_bind_ephemeral_ports_and_shut_down() {
        let server = Server::new(config(Protocol::Grpc, vec![EndpointDefinition::new("ep1")])).unwrap();
        let bound = server.bind().await.unwrap();

        assert!(bound.http_addr().is_none());
        assert!(bound.grpc_addr().is_some());

        let result = bound.serve(async {}).await;
        assert!(result.is_ok());
    }
}
