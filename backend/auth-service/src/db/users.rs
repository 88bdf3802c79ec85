/// User credential lookups
use crate::error::{Result, ServiceError};
use async_trait::async_trait;
use jwt_security::Role;
use sqlx::PgPool;
use uuid::Uuid;

/// Identity record as the login flow needs it
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    password_hash: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = ServiceError;

    /// An unknown stored role is a data error, never silently defaulted.
    fn try_from(row: UserRow) -> Result<Self> {
        let role = row.role.parse::<Role>().map_err(|_| {
            ServiceError::Database(format!("user {} has unknown role '{}'", row.id, row.role))
        })?;

        Ok(UserRecord {
            id: row.id,
            email: row.email,
            role,
            password_hash: row.password_hash,
        })
    }
}

/// Read access to the credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `email` is already normalized (trimmed, lowercased).
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, role, password_hash FROM users WHERE lower(email) = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRecord::try_from).transpose()
    }
}
