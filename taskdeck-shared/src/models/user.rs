/// User model and database operations
///
/// A user may sign in with a password, with an OAuth provider, or with both
/// once the accounts have been linked. Email is always present and is stored
/// trimmed and lowercased.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL UNIQUE,
///     password_hash VARCHAR(255),
///     provider_id VARCHAR(255) UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(1024),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::patch::Patch;

const USER_COLUMNS: &str =
    "id, email, password_hash, provider_id, name, avatar_url, created_at, updated_at";

/// Normalizes an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User row
///
/// Never serialized directly to clients; use [`PublicUser`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Lowercase email, unique across users
    pub email: String,

    /// Argon2id hash; `None` for OAuth-only accounts
    pub password_hash: Option<String>,

    /// Stable id from the external identity provider
    pub provider_id: Option<String>,

    /// Display name
    pub name: String,

    /// Optional avatar/profile picture URL
    pub avatar_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user
///
/// This is the only user shape that leaves the identity layer. The password
/// hash and provider id stay behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
        }
    }
}

impl User {
    /// Whether password login is possible for this account
    pub fn has_password(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Email (normalized by the caller)
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: Option<String>,

    /// External provider id for OAuth-created accounts
    pub provider_id: Option<String>,

    pub name: String,
    pub avatar_url: Option<String>,
}

/// Partial update for a user
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Patch<String>,
    pub password_hash: Patch<Option<String>>,
    pub provider_id: Patch<Option<String>>,
    pub name: Patch<String>,
    pub avatar_url: Patch<Option<String>>,
}

impl UpdateUser {
    /// Applies the patch to an in-memory copy
    pub fn apply(self, user: &mut User) {
        self.email.apply_to(&mut user.email);
        self.password_hash.apply_to(&mut user.password_hash);
        self.provider_id.apply_to(&mut user.provider_id);
        self.name.apply_to(&mut user.name);
        self.avatar_url.apply_to(&mut user.avatar_url);
    }
}

/// Aggregated task/project counts for a user's profile page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// Non-deleted tasks
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,

    /// Incomplete, not deleted, due before now
    pub overdue_tasks: i64,
    pub trashed_tasks: i64,
    pub total_projects: i64,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email or provider id is already taken
    /// (unique constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, provider_id, name, avatar_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.provider_id)
        .bind(data.name)
        .bind(data.avatar_url)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by (already normalized) email
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_provider_id(
        pool: &PgPool,
        provider_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE provider_id = $1"
        ))
        .bind(provider_id)
        .fetch_optional(pool)
        .await
    }

    /// Updates an existing user
    ///
    /// Only fields set in `data` are written; `updated_at` is always bumped.
    /// Returns `None` if the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE users SET updated_at = NOW()");

        if let Patch::Set(email) = data.email {
            builder.push(", email = ").push_bind(email);
        }
        if let Patch::Set(password_hash) = data.password_hash {
            builder.push(", password_hash = ").push_bind(password_hash);
        }
        if let Patch::Set(provider_id) = data.provider_id {
            builder.push(", provider_id = ").push_bind(provider_id);
        }
        if let Patch::Set(name) = data.name {
            builder.push(", name = ").push_bind(name);
        }
        if let Patch::Set(avatar_url) = data.avatar_url {
            builder.push(", avatar_url = ").push_bind(avatar_url);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(format!(" RETURNING {USER_COLUMNS}"));

        builder
            .build_query_as::<User>()
            .fetch_optional(pool)
            .await
    }

    /// Deletes a user by ID
    ///
    /// Projects and tasks are removed by `ON DELETE CASCADE`.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes profile statistics inside one transaction
    pub async fn stats(
        pool: &PgPool,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<UserStats, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // REPEATABLE READ so both counts see the same snapshot
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let (total_tasks, completed_tasks, overdue_tasks, trashed_tasks): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*) FILTER (WHERE NOT is_deleted),
                    COUNT(*) FILTER (WHERE NOT is_deleted AND is_complete),
                    COUNT(*) FILTER (WHERE NOT is_deleted AND NOT is_complete
                                     AND due_date IS NOT NULL AND due_date < $2),
                    COUNT(*) FILTER (WHERE is_deleted)
                FROM tasks
                WHERE user_id = $1
                "#,
            )
            .bind(id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let (total_projects,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM projects WHERE user_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        Ok(UserStats {
            total_tasks,
            completed_tasks,
            pending_tasks: total_tasks - completed_tasks,
            overdue_tasks,
            trashed_tasks,
            total_projects,
        })
    }
}
