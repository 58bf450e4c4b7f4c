use std::fmt;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use strum::{Display, EnumString};

use crate::types::AppError;

/// Username accepted by the access gate
pub const ADMIN_USERNAME: &str = "admin";

/// Which routes sit behind the access gate, selected by `ACCESS_GATE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum GatePolicy {
    /// Nothing is gated
    Off,
    /// Only the admin page is gated
    Admin,
    /// The admin page and the photo listing API are gated
    #[default]
    AdminAndListing,
}

impl GatePolicy {
    /// Whether `/admin` requires credentials
    #[must_use]
    pub const fn guards_admin(self) -> bool {
        matches!(self, Self::Admin | Self::AdminAndListing)
    }

    /// Whether `/api/list-photos` requires credentials
    #[must_use]
    pub const fn guards_listing(self) -> bool {
        matches!(self, Self::AdminAndListing)
    }

    /// Whether any route requires credentials
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.guards_admin() || self.guards_listing()
    }
}

/// HTTP Basic credential check with a single fixed account
#[derive(Clone)]
pub struct AccessGate {
    username: String,
    password: String,
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AccessGate {
    /// Creates a gate for the admin account with the given password
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            username: ADMIN_USERNAME.to_string(),
            password: password.into(),
        }
    }

    /// Checks an `Authorization` header value against the configured account.
    #[must_use]
    pub fn verify(&self, authorization: Option<&str>) -> bool {
        let Some((username, password)) = authorization.and_then(parse_basic_credentials) else {
            return false;
        };

        // Both comparisons always run, on fixed-length digests
        let username_ok = digest_eq(&username, &self.username);
        let password_ok = digest_eq(&password, &self.password);
        username_ok & password_ok
    }
}

fn digest_eq(left: &str, right: &str) -> bool {
    Sha256::digest(left.as_bytes()) == Sha256::digest(right.as_bytes())
}

/// Decodes `Basic <base64(user:password)>` into its two halves.
#[must_use]
pub fn parse_basic_credentials(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Basic authentication middleware
///
/// Rejects the request with 401 and a `WWW-Authenticate: Basic` challenge
/// unless it carries the gate's credentials. The wrapped handler never runs
/// for rejected requests. Without a configured [`AccessGate`] every request
/// is rejected.
///
/// # Errors
///
/// - `AppError` - Missing or wrong credentials with 401 status code
pub async fn basic_auth_middleware(
    gate: Option<Extension<Arc<AccessGate>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(Extension(gate)) = gate else {
        tracing::error!("Access gate is enabled but no credentials are configured");
        return Err(AppError::unauthorized());
    };

    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    if !gate.verify(authorization) {
        tracing::debug!(path = %request.uri().path(), "Rejected request at access gate");
        return Err(AppError::unauthorized());
    }

    Ok(next.run(request).await)
}
