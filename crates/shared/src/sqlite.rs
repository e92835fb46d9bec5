//! SQLite implementation of the repository traits

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

use crate::{
    error::{StoreError, StoreResult},
    repository::{GroupRepository, MembershipRepository, UserRepository},
    types::{Group, GroupChanges, GroupId, NewGroup, NewUser, User, UserChanges, UserId, UserWithGroups},
};

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId(row.id),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<GroupRow> for Group {
    fn from(row: GroupRow) -> Self {
        Self {
            id: GroupId(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const GROUP_COLUMNS: &str = "id, name, description, created_at, updated_at";

// =============================================================================
// Store
// =============================================================================

/// Repository backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn user_exists<'c, E>(executor: E, id: UserId) -> StoreResult<bool>
    where
        E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
    {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    async fn group_exists<'c, E>(executor: E, id: GroupId) -> StoreResult<bool>
    where
        E: sqlx::Executor<'c, Database = sqlx::Sqlite>,
    {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM groups WHERE id = ?)")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_with_groups(&self, id: UserId) -> StoreResult<Option<UserWithGroups>> {
        // One transaction so the user and its group set come from the same snapshot
        let mut tx = self.pool.begin().await?;

        let user: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(user) = user else {
            tx.commit().await?;
            return Ok(None);
        };

        let groups: Vec<GroupRow> = sqlx::query_as(
            r#"
            SELECT g.id, g.name, g.description, g.created_at, g.updated_at
            FROM groups g
            JOIN user_groups ug ON ug.group_id = g.id
            WHERE ug.user_id = ?
            ORDER BY g.id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(UserWithGroups {
            user: user.into(),
            groups: groups.into_iter().map(Group::from).collect(),
        }))
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let now = OffsetDateTime::now_utc();
        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(user_id = row.id, name = %row.name, "User created");
        Ok(row.into())
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> StoreResult<User> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for SqliteStore {
    async fn get(&self, id: GroupId) -> StoreResult<Option<Group>> {
        let row: Option<GroupRow> = sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Group::from))
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Group>> {
        let row: Option<GroupRow> = sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups WHERE name = ?"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Group::from))
    }

    async fn list(&self) -> StoreResult<Vec<Group>> {
        let rows: Vec<GroupRow> = sqlx::query_as(&format!("SELECT {GROUP_COLUMNS} FROM groups ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn create(&self, group: NewGroup) -> StoreResult<Group> {
        let now = OffsetDateTime::now_utc();
        let row: GroupRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO groups (name, description, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(&group.name)
        .bind(&group.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(group_id = row.id, name = %row.name, "Group created");
        Ok(row.into())
    }

    async fn update(&self, id: GroupId, changes: GroupChanges) -> StoreResult<Group> {
        let row: Option<GroupRow> = sqlx::query_as(&format!(
            r#"
            UPDATE groups
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                updated_at = ?
            WHERE id = ?
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(changes.name)
        .bind(changes.description)
        .bind(OffsetDateTime::now_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Group::from).ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: GroupId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for SqliteStore {
    async fn add_user_to_group(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::user_exists(&mut *tx, user_id).await? || !Self::group_exists(&mut *tx, group_id).await? {
            return Err(StoreError::NotFound);
        }

        sqlx::query("INSERT OR IGNORE INTO user_groups (user_id, group_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_user_from_group(&self, user_id: UserId, group_id: GroupId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if !Self::user_exists(&mut *tx, user_id).await? || !Self::group_exists(&mut *tx, group_id).await? {
            return Err(StoreError::NotFound);
        }

        sqlx::query("DELETE FROM user_groups WHERE user_id = ? AND group_id = ?")
            .bind(user_id)
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn user_groups(&self, user_id: UserId) -> StoreResult<Vec<Group>> {
        UserRepository::find_with_groups(self, user_id)
            .await?
            .map(|member| member.groups)
            .ok_or(StoreError::NotFound)
    }

    async fn group_users(&self, group_id: GroupId) -> StoreResult<Vec<User>> {
        let mut tx = self.pool.begin().await?;

        if !Self::group_exists(&mut *tx, group_id).await? {
            return Err(StoreError::NotFound);
        }

        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.created_at, u.updated_at
            FROM users u
            JOIN user_groups ug ON ug.user_id = u.id
            WHERE ug.group_id = ?
            ORDER BY u.id
            "#,
        )
        .bind(group_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
