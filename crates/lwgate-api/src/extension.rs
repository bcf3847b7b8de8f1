//! Route extensions
//!
//! Extensions contribute extra routes that are merged into the gateway router
//! and share its state. The gateway itself never depends on any being present.

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Extra routes mounted next to the built-in API
pub trait RouteExtension: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Routes to merge; paths must not collide with the built-in ones
    fn routes(&self) -> Router<AppState>;
}

/// Merge every extension's routes into `router`
pub fn merge_extensions(
    mut router: Router<AppState>,
    extensions: &[Arc<dyn RouteExtension>],
) -> Router<AppState> {
    for extension in extensions {
        tracing::info!(extension = extension.name(), "Mounting route extension");
        router = router.merge(extension.routes());
    }
    router
}
