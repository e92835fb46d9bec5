//! Startup seeding of the admin account

use gods_shared::{NewGroup, NewUser, StoreError, ADMIN_GROUP};

use crate::{
    auth::validate_password_strength,
    config::AdminSeed,
    error::ApiError,
    state::AppState,
};

/// Make sure the configured admin user exists and belongs to the `admin` group
///
/// Safe to run on every start: existing users, groups and memberships are
/// left as they are. A seed password that fails the policy skips seeding.
pub async fn ensure_admin(state: &AppState, seed: &AdminSeed) -> Result<(), ApiError> {
    if let Err(e) = validate_password_strength(&seed.password) {
        tracing::error!(name = %seed.name, error = %e, "Admin seed password rejected, skipping bootstrap");
        return Ok(());
    }

    let user = match state.users.find_by_name(&seed.name).await? {
        Some(user) => user,
        None => {
            let password_hash = state.auth.hash(seed.password.clone()).await?;
            match state
                .users
                .create(NewUser {
                    name: seed.name.clone(),
                    email: seed.email.clone(),
                    password_hash,
                })
                .await
            {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, name = %user.name, "Admin user created");
                    user
                }
                // Another instance created it first
                Err(StoreError::Conflict(_)) => state
                    .users
                    .find_by_name(&seed.name)
                    .await?
                    .ok_or(ApiError::Internal)?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    let group = match state.groups.find_by_name(ADMIN_GROUP).await? {
        Some(group) => group,
        None => match state
            .groups
            .create(NewGroup {
                name: ADMIN_GROUP.to_string(),
                description: Some("Administrators".to_string()),
            })
            .await
        {
            Ok(group) => {
                tracing::info!(group_id = %group.id, "Admin group created");
                group
            }
            // Another instance created it first
            Err(StoreError::Conflict(_)) => state
                .groups
                .find_by_name(ADMIN_GROUP)
                .await?
                .ok_or(ApiError::Internal)?,
            Err(e) => return Err(e.into()),
        },
    };

    state.memberships.add_user_to_group(user.id, group.id).await?;
    tracing::info!(user_id = %user.id, group_id = %group.id, "Admin membership ensured");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{Config, HashCost};
    use async_trait::async_trait;
    use gods_shared::{
        create_memory_pool, run_migrations, StoreResult, User, UserChanges, UserId,
        UserRepository, UserWithGroups,
    };
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    async fn state() -> AppState {
        let pool = create_memory_pool().await.unwrap();
        run_migrations(&pool).await.unwrap();
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            jwt_key: "test-jwt-key-must-be-at-least-32-characters".to_string(),
            jwt_expiry_hours: 1,
            hash_cost: HashCost {
                memory_kib: Some(1024),
                iterations: Some(1),
                parallelism: Some(1),
            },
            admin: None,
        };
        AppState::new(config, pool).unwrap()
    }

    fn seed(password: &str) -> AdminSeed {
        AdminSeed {
            name: "root".to_string(),
            email: "root@example.com".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let state = state().await;
        let seed = seed("Adm1n!pass");

        ensure_admin(&state, &seed).await.unwrap();
        ensure_admin(&state, &seed).await.unwrap();

        let users = state.users.list().await.unwrap();
        assert_eq!(users.len(), 1);

        let member = state.users.find_with_groups(users[0].id).await.unwrap().unwrap();
        assert!(member.is_admin());
        assert_eq!(member.groups.len(), 1);

        // Seeded admin can log in
        assert!(state.auth.login("root", "Adm1n!pass").await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_admin_joins_existing_group() {
        let state = state().await;
        let existing = state
            .groups
            .create(NewGroup {
                name: ADMIN_GROUP.to_string(),
                description: None,
            })
            .await
            .unwrap();

        ensure_admin(&state, &seed("Adm1n!pass")).await.unwrap();

        let members = state.memberships.group_users(existing.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "root");
    }

    #[tokio::test]
    async fn test_weak_seed_password_skips_bootstrap() {
        let state = state().await;

        ensure_admin(&state, &seed("weak")).await.unwrap();

        assert!(state.users.list().await.unwrap().is_empty());
        assert!(state.groups.list().await.unwrap().is_empty());
    }

    /// Hides the first name lookup, as if another instance inserted the
    /// user between our lookup and our insert
    struct LateUsers {
        inner: Arc<dyn UserRepository>,
        hide_next_lookup: AtomicBool,
    }

    #[async_trait]
    impl UserRepository for LateUsers {
        async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
            self.inner.get(id).await
        }

        async fn find_by_name(&self, name: &str) -> StoreResult<Option<User>> {
            if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_by_name(name).await
        }

        async fn find_with_groups(&self, id: UserId) -> StoreResult<Option<UserWithGroups>> {
            self.inner.find_with_groups(id).await
        }

        async fn list(&self) -> StoreResult<Vec<User>> {
            self.inner.list().await
        }

        async fn create(&self, user: NewUser) -> StoreResult<User> {
            self.inner.create(user).await
        }

        async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<User> {
            self.inner.update(id, changes).await
        }

        async fn delete(&self, id: UserId) -> StoreResult<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_ensure_admin_survives_concurrent_user_creation() {
        let mut state = state().await;
        let existing = state
            .users
            .create(NewUser {
                name: "root".to_string(),
                email: "root@example.com".to_string(),
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        state.users = Arc::new(LateUsers {
            inner: state.users.clone(),
            hide_next_lookup: AtomicBool::new(true),
        });

        ensure_admin(&state, &seed("Adm1n!pass")).await.unwrap();

        let users = state.users.list().await.unwrap();
        assert_eq!(users.len(), 1);
        let member = state.users.find_with_groups(existing.id).await.unwrap().unwrap();
        assert!(member.is_admin());
    }
}
