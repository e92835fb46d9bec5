//! Authentication module for GODS

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtError, JwtManager};
pub use middleware::{require_admin, require_auth, AuthState, AuthUser};
pub use password::{
    hash_password, validate_password_strength, verify_password, PasswordError, PasswordHasher,
    PasswordValidationError,
};
pub use service::{AuthError, AuthService, Signup};
