//! Persistence capabilities consumed by the API
//!
//! Handlers and the auth core only see these traits, injected as
//! `Arc<dyn ...>`. [`crate::SqliteStore`] implements all three.

use async_trait::async_trait;

use crate::{
    error::StoreResult,
    types::{Group, GroupChanges, GroupId, NewGroup, NewUser, User, UserChanges, UserId, UserWithGroups},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<User>>;

    /// Load a user and its current groups in one consistent read
    async fn find_with_groups(&self, id: UserId) -> StoreResult<Option<UserWithGroups>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Insert a user, failing with `StoreError::Conflict` when the name is taken
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<User>;

    async fn delete(&self, id: UserId) -> StoreResult<()>;
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn get(&self, id: GroupId) -> StoreResult<Option<Group>>;

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Group>>;

    async fn list(&self) -> StoreResult<Vec<Group>>;

    async fn create(&self, group: NewGroup) -> StoreResult<Group>;

    async fn update(&self, id: GroupId, changes: GroupChanges) -> StoreResult<Group>;

    async fn delete(&self, id: GroupId) -> StoreResult<()>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Adding an existing membership is a no-op
    async fn add_user_to_group(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()>;

    async fn remove_user_from_group(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()>;

    async fn user_groups(&self, user_id: UserId) -> StoreResult<Vec<Group>>;

    async fn group_users(&self, group_id: GroupId) -> StoreResult<Vec<User>>;
}
