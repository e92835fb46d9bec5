//! GODS Shared Types and Persistence
//!
//! Domain types, repository traits and the SQLite store used by the API.

pub mod db;
pub mod error;
pub mod repository;
pub mod sqlite;
pub mod types;

pub use db::*;
pub use error::*;
pub use repository::{GroupRepository, MembershipRepository, UserRepository};
pub use sqlite::SqliteStore;
pub use types::*;
