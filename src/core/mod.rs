pub mod config;
pub mod jwt_auth;
mod responses;
mod telemetry;

pub use self::config::AppConfig;
pub use responses::*;
pub use telemetry::*;
