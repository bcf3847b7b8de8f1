//! lwgate-api - REST API layer for the device-management gateway
//!
//! Exposes the gateway core over HTTP: asynchronous device operations,
//! notification pull and webhook subscription, and the device credential
//! database.
//!
//! # Usage
//!
//! ```ignore
//! use lwgate_api::{create_router, AppState, ReqwestSender};
//!
//! let sender = Arc::new(ReqwestSender::new(timeout)?);
//! let state = AppState::new(gateway, sender);
//! let router = create_router(state);
//! ```

pub mod error;
pub mod extension;
pub mod handlers;
pub mod state;
pub mod testing;
pub mod webhook;

pub use error::ApiError;
pub use extension::{merge_extensions, RouteExtension};
pub use state::AppState;
pub use webhook::{push_pending, spawn_push_worker, ReqwestSender, DEFAULT_CALLBACK_TIMEOUT};

use std::sync::Arc;

use axum::routing::{any, get};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the gateway REST router with the given application state
pub fn create_router(state: AppState) -> Router {
    create_router_with_extensions(state, &[])
}

/// Create the router and merge the routes of `extensions` into it
pub fn create_router_with_extensions(
    state: AppState,
    extensions: &[Arc<dyn RouteExtension>],
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Device operations
        .route("/endpoints", get(handlers::endpoints::list_endpoints))
        .route(
            "/endpoints/{name}/{*path}",
            any(handlers::endpoints::resource_operation),
        )
        // Notifications
        .route("/notifications/pull", get(handlers::notifications::pull))
        .route(
            "/notifications/callback",
            get(handlers::notifications::get_callback)
                .put(handlers::notifications::put_callback)
                .delete(handlers::notifications::delete_callback),
        )
        // Device credentials
        .route(
            "/devices",
            get(handlers::devices::list_devices).post(handlers::devices::create_device),
        )
        .route(
            "/devices/{uuid}",
            get(handlers::devices::get_device)
                .put(handlers::devices::update_device)
                .delete(handlers::devices::delete_device),
        );

    merge_extensions(router, extensions)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
