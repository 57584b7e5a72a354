//! Scriba is a lightweight blog backend with account management.

#[forbid(unsafe_code)]
#[deny(missing_docs, unused_mut)]
mod comment;
mod crypto;
mod database;
pub mod error;
mod mail;
mod media;
mod oauth;
mod post;
mod router;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
pub use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

pub const DEFAULT_PORT: u16 = 8913;

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub crypto: Arc<crypto::PasswordManager>,
    pub token: token::TokenManager,
    pub mail: mail::MailManager,
    pub oauth: Option<oauth::Provider>,
    pub media: Option<media::MediaHost>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout. Late requests get 408 back.
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let guarded = Router::new()
        // `GET /me` goes to `me`. Authorization required.
        .route("/me", get(router::me::handler))
        // `POST /upload` goes to `upload`. Authorization required.
        .route("/upload", post(router::upload::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            router::guard,
        ));

    Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        // `POST /register` goes to `create`.
        .route("/register", post(router::create::handler))
        // Delegated login handshake.
        .route("/auth/google", get(router::oauth::redirect))
        .route("/auth/google/callback", get(router::oauth::callback))
        .route("/auth/google/complete", post(router::oauth::complete))
        // `GET /authors/:NAME/posts` goes to `by_author`.
        .route("/authors/{name}/posts", get(router::posts::by_author))
        .merge(guarded)
        .nest("/posts", router::posts::router(state.clone()))
        .merge(router::comments::router(state.clone()))
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>>
{
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match config.postgres {
        Some(ref config) => database::Database::new(config).await?,
        None => {
            // The backing store is not optional; better to die now than to
            // serve requests that can only fail.
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(1);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    let crypto = Arc::new(crypto::PasswordManager::new(config.argon2.clone())?);

    // handle session tokens.
    let Some(token) = &config.token else {
        tracing::error!("missing `token` entry on `config.yaml` file");
        std::process::exit(1);
    };
    let token =
        token::TokenManager::new(&config.url, &token.secret, token.expires_in);

    // handle mail sender.
    let mail = config
        .mail
        .as_ref()
        .map(mail::MailManager::new)
        .unwrap_or_default();

    // handle delegated login.
    let oauth = config.oauth.as_ref().map(oauth::Provider::new);
    if oauth.is_none() {
        tracing::warn!("missing `oauth` entry, delegated login disabled");
    }

    // handle media host.
    let media = config.media.as_ref().map(media::MediaHost::new);

    Ok(AppState {
        config,
        db,
        crypto,
        token,
        mail,
        oauth,
        media,
    })
}
