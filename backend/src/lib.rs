//! Photo upload gateway
//!
//! Issues presigned upload URLs for an R2 bucket, lists uploaded photos and
//! serves the static pages that drive both.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]

/// Access gate middleware
pub mod middleware;

/// Object store abstraction and its R2 implementation
pub mod photo_storage;

/// Upload tickets and photo listings
pub mod photos;

/// HTTP routes
pub mod routes;

/// Server assembly and startup
pub mod server;

/// Configuration, errors and extractors
pub mod types;
