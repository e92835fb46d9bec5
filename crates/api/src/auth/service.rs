//! Login and signup orchestration

use std::sync::Arc;

use gods_shared::{NewUser, StoreError, User, UserRepository};

use super::{
    jwt::{JwtError, JwtManager},
    password::{validate_password_strength, PasswordHasher, PasswordValidationError},
};

/// Signup input as submitted by the client
#[derive(Debug, Clone)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Credential checks and token issuance
///
/// Holds no per-request state; every call is independent given the store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    jwt: JwtManager,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, jwt: JwtManager) -> Self {
        Self { users, hasher, jwt }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    /// Check a name/password pair and issue a session token
    ///
    /// An unknown name and a wrong password fail identically. The name is
    /// trimmed exactly as at signup.
    pub async fn login(&self, name: &str, password: &str) -> Result<String, AuthError> {
        let name = name.trim();
        let user = self.users.find_by_name(name).await?;

        let verified = {
            let hasher = self.hasher.clone();
            let password = password.to_string();
            let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
            tokio::task::spawn_blocking(move || match stored_hash {
                Some(hash) => hasher.verify(&password, &hash),
                None => {
                    hasher.verify_dummy(&password);
                    false
                }
            })
            .await
            .map_err(|_| AuthError::Hashing)?
        };

        let user = match user {
            Some(user) if verified => user,
            Some(user) => {
                tracing::warn!(user_id = %user.id, "login: Wrong password");
                return Err(AuthError::InvalidCredentials);
            }
            None => {
                tracing::warn!(name = %name, "login: User not found");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let token = self.jwt.generate_token(user.id)?;
        tracing::info!(user_id = %user.id, "login: Token issued");
        Ok(token)
    }

    /// Register a new user
    ///
    /// All validation happens before the single insert, so a failed signup
    /// leaves the store untouched. No token is issued.
    pub async fn signup(&self, req: Signup) -> Result<User, AuthError> {
        if req.password != req.password_confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if !is_valid_email(&req.email) {
            return Err(AuthError::Validation("Invalid email format".to_string()));
        }

        // Best-effort pre-check; the UNIQUE constraint settles races below
        if self.users.find_by_name(name).await?.is_some() {
            return Err(AuthError::AlreadyExists);
        }

        validate_password_strength(&req.password)?;

        let password_hash = self.hash(req.password).await?;

        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: req.email.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::AlreadyExists,
                other => AuthError::Lookup(other),
            })?;

        tracing::info!(user_id = %user.id, name = %user.name, "signup: User registered");
        Ok(user)
    }

    /// Hash on the blocking pool; Argon2 is deliberately slow
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|_| AuthError::Hashing)?
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing failed");
                AuthError::Hashing
            })
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("hasher", &self.hasher)
            .field("jwt", &self.jwt)
            .finish_non_exhaustive()
    }
}

/// Simplified address check: one `@`, non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.is_empty() || email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("User already exists")]
    AlreadyExists,
    #[error(transparent)]
    WeakPassword(#[from] PasswordValidationError),
    #[error("{0}")]
    Validation(String),
    #[error("Password hashing failed")]
    Hashing,
    #[error(transparent)]
    Token(#[from] JwtError),
    #[error("User lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{auth::password::hash_password, config::HashCost};
    use async_trait::async_trait;
    use gods_shared::{
        create_memory_pool, run_migrations, SqliteStore, StoreResult, UserChanges, UserId,
        UserWithGroups,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SECRET: &str = "test-secret-key-at-least-32-chars!";

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashCost {
            memory_kib: Some(1024),
            iterations: Some(1),
            parallelism: Some(1),
        })
        .unwrap()
    }

    async fn sqlite_service() -> AuthService {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        AuthService::new(
            Arc::new(SqliteStore::new(pool)),
            hasher(),
            JwtManager::new(SECRET, 24),
        )
    }

    fn signup(name: &str, password: &str, confirmation: &str) -> Signup {
        Signup {
            name: name.to_string(),
            email: "a@x.com".to_string(),
            password: password.to_string(),
            password_confirmation: confirmation.to_string(),
        }
    }

    /// Store that records calls and never holds data
    #[derive(Default)]
    struct CountingStore {
        lookups: AtomicUsize,
        creates: AtomicUsize,
    }

    #[async_trait]
    impl UserRepository for CountingStore {
        async fn get(&self, _id: UserId) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_name(&self, _name: &str) -> StoreResult<Option<User>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        async fn find_with_groups(&self, _id: UserId) -> StoreResult<Option<UserWithGroups>> {
            Ok(None)
        }

        async fn list(&self) -> StoreResult<Vec<User>> {
            Ok(Vec::new())
        }

        async fn create(&self, _user: NewUser) -> StoreResult<User> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Database("read-only".to_string()))
        }

        async fn update(&self, _id: UserId, _changes: UserChanges) -> StoreResult<User> {
            Err(StoreError::NotFound)
        }

        async fn delete(&self, _id: UserId) -> StoreResult<()> {
            Err(StoreError::NotFound)
        }
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let auth = sqlite_service().await;

        let user = auth.signup(signup("alice", "Str0ng!Pw", "Str0ng!Pw")).await.unwrap();
        assert_eq!(user.name, "alice");
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "Str0ng!Pw");

        let token = auth.login("alice", "Str0ng!Pw").await.unwrap();
        assert_eq!(auth.jwt().validate_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_name_whitespace_is_ignored_on_both_paths() {
        let auth = sqlite_service().await;

        let user = auth.signup(signup("alice ", "Str0ng!Pw", "Str0ng!Pw")).await.unwrap();
        assert_eq!(user.name, "alice");

        for name in ["alice ", "alice", "  alice"] {
            let token = auth.login(name, "Str0ng!Pw").await.unwrap();
            assert_eq!(auth.jwt().validate_token(&token).unwrap(), user.id);
        }

        let duplicate = auth.signup(signup(" alice", "Str0ng!Pw", "Str0ng!Pw")).await;
        assert!(matches!(duplicate, Err(AuthError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = sqlite_service().await;
        auth.signup(signup("alice", "Str0ng!Pw", "Str0ng!Pw")).await.unwrap();

        let unknown = auth.login("mallory", "Str0ng!Pw").await.unwrap_err();
        let wrong = auth.login("alice", "Wr0ng!Pw").await.unwrap_err();

        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn test_signup_mismatch_checked_before_anything_else() {
        let store = Arc::new(CountingStore::default());
        let auth = AuthService::new(store.clone(), hasher(), JwtManager::new(SECRET, 24));

        // Weak and mismatched: the mismatch wins, and nothing is looked up or written
        let result = auth.signup(signup("alice", "weak", "other")).await;
        assert!(matches!(result, Err(AuthError::PasswordMismatch)));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_weak_password_not_persisted() {
        let store = Arc::new(CountingStore::default());
        let auth = AuthService::new(store.clone(), hasher(), JwtManager::new(SECRET, 24));

        let result = auth.signup(signup("alice", "str0ng!pw", "str0ng!pw")).await;
        assert!(matches!(
            result,
            Err(AuthError::WeakPassword(PasswordValidationError::MissingUppercase))
        ));
        assert_eq!(store.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_signup_duplicate_name() {
        let auth = sqlite_service().await;
        auth.signup(signup("alice", "Str0ng!Pw", "Str0ng!Pw")).await.unwrap();

        let result = auth.signup(signup("alice", "An0ther!Pw", "An0ther!Pw")).await;
        assert!(matches!(result, Err(AuthError::AlreadyExists)));

        // Old password still works: the second signup wrote nothing
        assert!(auth.login("alice", "Str0ng!Pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_signups_with_same_name() {
        let auth = sqlite_service().await;

        let (first, second) = tokio::join!(
            auth.signup(signup("alice", "Str0ng!Pw", "Str0ng!Pw")),
            auth.signup(signup("alice", "Str0ng!Pw", "Str0ng!Pw")),
        );

        let outcomes = [first, second];
        let successes = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AuthError::AlreadyExists)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(conflicts, 1);
    }

    #[tokio::test]
    async fn test_signup_input_validation() {
        let auth = sqlite_service().await;

        let result = auth.signup(signup("   ", "Str0ng!Pw", "Str0ng!Pw")).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));

        let mut bad_email = signup("alice", "Str0ng!Pw", "Str0ng!Pw");
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(auth.signup(bad_email).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_with_hash_from_default_cost() {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store = SqliteStore::new(pool);
        let root = NewUser {
            name: "root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: hash_password("R00t!pass").unwrap(),
        };
        UserRepository::create(&store, root).await.unwrap();

        let auth = AuthService::new(Arc::new(store), hasher(), JwtManager::new(SECRET, 24));
        assert!(auth.login("root", "R00t!pass").await.is_ok());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@.com"));
    }
}
