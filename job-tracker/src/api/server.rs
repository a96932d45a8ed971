//! API server setup and configuration.

use axum::Router;
use axum::extract::{DefaultBodyLimit, FromRef, Request};
use axum::http::{HeaderValue, Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::api::auth_service::AuthService;
use crate::api::jwt::JwtService;
use crate::api::routes;
use crate::api::validation::ValidationRules;
use crate::config::{env_non_empty, env_parse_or};
use crate::error::{Error, Result};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Browser origin allowed to send credentialed requests
    pub client_url: Option<String>,
    /// Production mode; refresh cookies are marked `Secure`
    pub production: bool,
    /// Request body size limit in bytes
    pub body_limit: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            client_url: None,
            production: false,
            body_limit: 1024 * 1024, // 1MB
        }
    }
}

impl ApiServerConfig {
    /// Load API server config from environment variables, falling back to defaults.
    ///
    /// Supported env vars:
    /// - `API_BIND_ADDRESS` (e.g. "0.0.0.0")
    /// - `API_PORT` or `PORT` (e.g. "3000")
    /// - `CLIENT_URL` (e.g. "http://localhost:5173")
    /// - `APP_ENV` or `NODE_ENV` ("production" enables secure cookies)
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Some(bind_address) = env_non_empty("API_BIND_ADDRESS") {
            config.bind_address = bind_address;
        }

        config.port = env_parse_or("API_PORT", env_parse_or("PORT", config.port));
        config.client_url = env_non_empty("CLIENT_URL");

        config.production = env_non_empty("APP_ENV")
            .or_else(|| env_non_empty("NODE_ENV"))
            .is_some_and(|env| env.eq_ignore_ascii_case("production"));

        config
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime calculation
    pub start_time: Instant,
    /// Verifies access tokens on protected routes
    pub access_jwt: Arc<JwtService>,
    /// Auth service for accounts and token issuance
    pub auth_service: Arc<AuthService>,
    /// Whether refresh cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

impl AppState {
    /// Create application state around an auth service.
    pub fn new(access_jwt: Arc<JwtService>, auth_service: Arc<AuthService>) -> Self {
        Self {
            start_time: Instant::now(),
            access_jwt,
            auth_service,
            secure_cookies: false,
        }
    }

    /// Set whether refresh cookies are marked `Secure`.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

impl FromRef<AppState> for ValidationRules {
    fn from_ref(state: &AppState) -> Self {
        Self {
            min_password_length: state.auth_service.config().min_password_length,
        }
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    /// Create a server for the given state.
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        let state = state.with_secure_cookies(config.production);
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn cors_layer(&self) -> CorsLayer {
        match self
            .config
            .client_url
            .as_deref()
            .and_then(|url| HeaderValue::from_str(url).ok())
        {
            // Credentialed CORS cannot use wildcards.
            Some(origin) => CorsLayer::new()
                .allow_origin(AllowOrigin::exact(origin))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true),
            None => CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        }
    }

    /// Build the router with all middleware and routes.
    pub fn build_router(&self) -> Router {
        let mut router = routes::create_router(self.state.clone())
            .layer(DefaultBodyLimit::max(self.config.body_limit));

        if self.config.enable_cors {
            router = router.layer(self.cors_layer());
        }

        // Health checks are too chatty to trace.
        router = router.layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if req.uri().path().starts_with("/api/health") {
                        Span::none()
                    } else {
                        let mut make_span =
                            tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO);
                        use tower_http::trace::MakeSpan;
                        make_span.make_span(req)
                    }
                })
                .on_request(|req: &Request, span: &Span| {
                    if span.is_disabled() {
                        return;
                    }
                    let mut on_request =
                        tower_http::trace::DefaultOnRequest::new().level(tracing::Level::INFO);
                    use tower_http::trace::OnRequest;
                    on_request.on_request(req, span);
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        if span.is_disabled() {
                            return;
                        }
                        let on_response =
                            tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO);
                        use tower_http::trace::OnResponse;
                        on_response.on_response(res, latency, span);
                    },
                ),
        );
        router
    }

    /// Start the server.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("API server listening on http://{}", addr);

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(config.enable_cors);
        assert!(!config.production);
        assert!(config.client_url.is_none());
    }

    #[tokio::test]
    async fn test_server_creation() {
        let config = ApiServerConfig {
            production: true,
            ..Default::default()
        };
        let server = ApiServer::new(config, test_support::test_state().await);

        assert!(server.state.secure_cookies);
        assert!(!server.cancel_token().is_cancelled());
        server.shutdown();
        assert!(server.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_validation_rules_follow_auth_config() {
        let state = test_support::test_state().await;
        let rules = ValidationRules::from_ref(&state);
        assert_eq!(
            rules.min_password_length,
            state.auth_service.config().min_password_length
        );
    }

    #[tokio::test]
    async fn test_credentialed_cors_with_client_url() {
        let config = ApiServerConfig {
            client_url: Some("http://localhost:5173".to_string()),
            ..Default::default()
        };
        let server = ApiServer::new(config, test_support::test_state().await);
        // Building must not panic: wildcard origins are rejected with credentials.
        let _router = server.build_router();
    }
}
