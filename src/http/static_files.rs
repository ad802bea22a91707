//! Static file handler.
//!
//! Maps the request path onto the serving root, infers the content type from
//! the extension, serves `index.html` for directories, and answers 404 for
//! anything missing. Directory listings are not generated.

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// Router serving every path from `root`.
pub fn router(root: impl AsRef<Path>) -> Router {
    let root = root.as_ref();
    tracing::debug!(root = %root.display(), "Static file handler configured");
    Router::new().fallback_service(ServeDir::new(root).append_index_html_on_directories(true))
}
