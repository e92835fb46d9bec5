//! GODS API Library
//!
//! Account, group and membership management behind JWT authentication and
//! an `admin` group check.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
