//! HTTP surface: routes, reply shaping, CORS and the serve loop.

use crate::app::App;
use crate::config::{AllowedOrigins, Config};
use crate::models::{
    EditImageRequest, ErrorReply, FailureReply, GenerateImageRequest, HealthReply, ImageReply,
    IndexReply, RelayResult,
};
use crate::{Error, Result};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

const ENDPOINTS: [&str; 3] = ["/api/health", "/api/generate-image", "/api/edit-image"];

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (
            status,
            Json(ErrorReply {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// 200 with the image when the relay succeeded, 500 with the attempt history
/// otherwise. Both endpoints share this policy.
fn relay_reply(result: RelayResult) -> Response {
    let retry_info = result.retry_info();

    if result.succeeded {
        return (
            StatusCode::OK,
            Json(ImageReply {
                text: result.text,
                image_data: result.image.map(|image| image.data),
                retry_info,
            }),
        )
            .into_response();
    }

    let last_error = result
        .last_error()
        .map(|record| record.message.as_str())
        .unwrap_or("unknown error");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(FailureReply {
            error: format!(
                "Failed after {} attempts. Last error: {}",
                result.attempts, last_error
            ),
            retry_info,
        }),
    )
        .into_response()
}

/// Unwraps a JSON body. A missing, unparseable, empty or non-object body is
/// "No data provided"; an oversized one is 413.
fn json_body<T: DeserializeOwned>(
    body: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<T> {
    let value = match body {
        Ok(Json(value)) => value,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(Error::PayloadTooLarge(rejection.body_text()));
        }
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            return Err(no_data());
        }
    };

    if !value.as_object().is_some_and(|fields| !fields.is_empty()) {
        return Err(no_data());
    }

    serde_json::from_value(value).map_err(|e| {
        debug!("Request body has unexpected shape: {}", e);
        no_data()
    })
}

fn no_data() -> Error {
    Error::Validation("No data provided".to_string())
}

async fn index() -> Json<IndexReply> {
    Json(IndexReply {
        message: "AI Photo Editor API".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

async fn health() -> Json<HealthReply> {
    Json(HealthReply {
        status: "ok".to_string(),
        message: "Backend server is running".to_string(),
    })
}

async fn generate_image(
    State(app): State<Arc<App>>,
    body: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response> {
    let request: GenerateImageRequest = json_body(body)?;
    let result = app.generate_image(request).await?;
    Ok(relay_reply(result))
}

async fn edit_image(
    State(app): State<Arc<App>>,
    body: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response> {
    let request: EditImageRequest = json_body(body)?;
    let result = app.edit_image(request).await?;
    Ok(relay_reply(result))
}

fn cors_layer(origins: &AllowedOrigins) -> Result<CorsLayer> {
    let allow_origin = match origins {
        AllowedOrigins::Any => AllowOrigin::any(),
        AllowedOrigins::List(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|e| {
                        Error::Config(format!("Invalid origin '{}' in ALLOWED_ORIGINS: {}", origin, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            AllowOrigin::list(values)
        }
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any))
}

/// Build the router. Fails on an unusable CORS origin.
pub fn router(app: Arc<App>, config: &Config) -> Result<Router> {
    let cors = cors_layer(&config.allowed_origins)?;

    Ok(Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/generate-image", post(generate_image))
        .route("/api/edit-image", post(edit_image))
        .with_state(app)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

/// Bind and serve until Ctrl-C or SIGTERM.
pub async fn serve(app: Arc<App>, config: &Config) -> Result<()> {
    let router = router(app, config)?;
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server starting on http://{} (debug={})", addr, config.debug);
    match &config.allowed_origins {
        AllowedOrigins::Any => info!("Allowing CORS for any origin"),
        AllowedOrigins::List(list) => info!("Allowing CORS for: {}", list.join(", ")),
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
