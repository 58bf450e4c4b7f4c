//! HTML pages served from the pages directory

use std::path::Path;

use aide::axum::ApiRouter;
use axum::routing::get_service;
use tower_http::services::ServeFile;

pub const LANDING_PAGE: &str = "index.html";
pub const ADMIN_PAGE: &str = "admin.html";

/// `GET /`
pub fn landing(pages_dir: &Path) -> ApiRouter {
    ApiRouter::new().route(
        "/",
        get_service(ServeFile::new(pages_dir.join(LANDING_PAGE))),
    )
}

/// `GET /admin`
pub fn admin(pages_dir: &Path) -> ApiRouter {
    ApiRouter::new().route(
        "/admin",
        get_service(ServeFile::new(pages_dir.join(ADMIN_PAGE))),
    )
}
