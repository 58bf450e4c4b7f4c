mod pages;
pub mod photos;
mod service;

use std::path::Path;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::middleware;

use crate::middleware::{basic_auth_middleware, GatePolicy};

/// Creates the router with all handler routes
///
/// `policy` decides which of the listing API and the admin page sit behind
/// the access gate; everything else is always public.
pub fn handler(policy: GatePolicy, pages_dir: &Path) -> ApiRouter {
    let listing_routes =
        ApiRouter::new().api_route("/api/list-photos", get(photos::list_photos));
    let admin_routes = pages::admin(pages_dir);

    let mut public_routes = ApiRouter::new()
        .merge(service::handler())
        .api_route("/api/get-upload-url", post(photos::get_upload_url))
        .merge(pages::landing(pages_dir));
    let mut protected_routes = ApiRouter::new();

    if policy.guards_listing() {
        protected_routes = protected_routes.merge(listing_routes);
    } else {
        public_routes = public_routes.merge(listing_routes);
    }

    if policy.guards_admin() {
        protected_routes = protected_routes.merge(admin_routes);
    } else {
        public_routes = public_routes.merge(admin_routes);
    }

    public_routes.merge(protected_routes.layer(middleware::from_fn(basic_auth_middleware)))
}
