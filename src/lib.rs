//! PDF Study Server
//!
//! Upload a PDF, page through rendered pages, extract its text, and turn it
//! into summaries, exam questions and spoken narration.

pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod pdf;
pub mod routes;
pub mod session;
pub mod speech;
pub mod state;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .merge(routes::health::router())
        .merge(routes::document::router(max_upload_bytes))
        .merge(routes::study::router())
        .nest("/speech", routes::speech::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
