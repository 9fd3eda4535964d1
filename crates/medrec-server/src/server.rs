use std::net::SocketAddr;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use medrec_notifications::Mailer;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{AppConfig, StorageBackend},
    handlers,
    middleware::{self as app_middleware, RequestId},
    state::AppState,
};

pub struct MedrecServer {
    addr: SocketAddr,
    app: Router,
}

/// Connects the configured storage backend and mail transport.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let mailer = Mailer::from_config(&cfg.mail)?;
    let production = cfg.is_production();

    let state = match cfg.storage.backend {
        StorageBackend::Postgres => {
            let storage = medrec_db_postgres::create_storage(cfg.storage.postgres.clone()).await?;
            AppState::new(storage, mailer, &cfg.auth, production)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, all data is lost on restart");
            AppState::new(
                medrec_db_memory::create_storage(),
                mailer,
                &cfg.auth,
                production,
            )
        }
    };
    Ok(state)
}

fn api_routes() -> Router<AppState> {
    let auth = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        .route("/verify-email", post(handlers::auth::verify_email))
        .route("/resend-code", post(handlers::auth::resend_code))
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password/{token}", post(handlers::auth::reset_password));

    let patients = Router::new()
        .route(
            "/",
            get(handlers::patients::list_patients).post(handlers::patients::create_patient),
        )
        .route(
            "/{id}",
            get(handlers::patients::get_patient)
                .put(handlers::patients::update_patient)
                .delete(handlers::patients::delete_patient),
        );

    let diagnoses = Router::new()
        .route("/", post(handlers::diagnoses::create_diagnosis))
        .route(
            "/patient/{patient_id}",
            get(handlers::diagnoses::list_patient_diagnoses),
        )
        .route(
            "/{id}",
            get(handlers::diagnoses::get_diagnosis)
                .put(handlers::diagnoses::update_diagnosis)
                .delete(handlers::diagnoses::delete_diagnosis),
        );

    Router::new()
        .nest("/auth", auth)
        .nest("/patients", patients)
        .nest("/diagnoses", diagnoses)
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health endpoints
        .route("/healthz", get(handlers::health::healthz))
        .route("/readyz", get(handlers::health::readyz))
        .nest("/api", api_routes())
        .fallback(handlers::health::not_found)
        .with_state(state)
        .layer(
            // Top to bottom is outermost to innermost.
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<RequestId>()
                                .and_then(|id| id.0.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri().path(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &axum::http::Response<axum::body::Body>,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(cors_layer(cfg))
                .layer(axum::extract::DefaultBodyLimit::max(body_limit)),
        )
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    state: Option<AppState>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            state: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Uses a prepared state instead of connecting the configured backend.
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub async fn build(self) -> anyhow::Result<MedrecServer> {
        let state = match self.state {
            Some(state) => state,
            None => build_state(&self.config).await?,
        };
        let app = build_app(state, &self.config);

        Ok(MedrecServer {
            addr: self.addr,
            app,
        })
    }
}

impl MedrecServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
