pub mod config;
mod environment;
mod error;
mod extractors;

pub use config::{AccessSettings, Config, ConfigError, R2Settings, SiteDirs};
pub use environment::Environment;
pub use error::{ApiErrorResponse, AppError};
pub use extractors::JsonBody;
