/// User model and database operations
///
/// Accounts are created by registration and read everywhere else: by id when
/// resolving the requester of an operation, by email at login and whenever an
/// invitation is created, accepted or listed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255),
///     profile_image VARCHAR(512),
///     provider auth_provider NOT NULL DEFAULT 'local',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// if let Some(user) = User::find_by_email(&pool, "bob@example.com").await? {
///     println!("Found {}", user.id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// How the account authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthProvider {
    /// Email and password
    Local,

    /// Google OAuth
    Google,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address, stored normalized (trimmed, lowercase)
    pub email: String,

    /// Display name
    pub name: String,

    /// Password hash, None for OAuth-only accounts
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    /// Optional profile image URL
    pub profile_image: Option<String>,

    /// Provider the account was created with
    pub provider: AuthProvider,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub profile_image: Option<String>,
    pub provider: AuthProvider,
}

impl CreateUser {
    /// Local account without a password, handy for seeding
    pub fn local(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password_hash: None,
            profile_image: None,
            provider: AuthProvider::Local,
        }
    }
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, profile_image, provider, created_at, updated_at";

impl User {
    /// Builds an in-memory user with fresh timestamps
    ///
    /// Used by the in-memory store; the database assigns these values itself.
    pub fn from_create(data: CreateUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: data.email.trim().to_lowercase(),
            name: data.name,
            password_hash: data.password_hash,
            profile_image: data.profile_image,
            provider: data.provider,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email already exists or the database fails
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (email, name, password_hash, profile_image, provider) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.email.trim().to_lowercase())
            .bind(data.name)
            .bind(data.password_hash)
            .bind(data.profile_image)
            .bind(data.provider)
            .fetch_one(executor)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Row-locks the user until the surrounding transaction ends
    ///
    /// Returns false if no such user exists. Only meaningful inside a
    /// transaction.
    pub async fn lock_for_update<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(row.is_some())
    }

    /// Finds a user by email
    ///
    /// The caller is expected to pass an already normalized address.
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Finds every user whose email is in `emails`, in one round trip
    pub async fn find_by_emails<'e, E>(
        executor: E,
        emails: &[String],
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ANY($1)");

        sqlx::query_as::<_, User>(&query)
            .bind(emails)
            .fetch_all(executor)
            .await
    }
}
