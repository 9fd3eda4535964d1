//! User accounts.

use async_trait::async_trait;
use medrec_auth::{User, UserStorage};
use medrec_storage::{StorageError, StorageResult};
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::PostgresError;
use crate::storage::PostgresStorage;

type UserTuple = (
    Uuid,
    String,
    String,
    String,
    bool,
    Option<String>,
    Option<OffsetDateTime>,
    Option<String>,
    Option<OffsetDateTime>,
    OffsetDateTime,
    OffsetDateTime,
);

const USER_COLUMNS: &str = "id, name, email, password_hash, is_verified, \
    verification_code, verification_expires_at, reset_token_hash, reset_expires_at, \
    created_at, updated_at";

fn from_tuple(row: UserTuple) -> User {
    User {
        id: row.0,
        name: row.1,
        email: row.2,
        password_hash: row.3,
        is_verified: row.4,
        verification_code: row.5,
        verification_expires_at: row.6,
        reset_token_hash: row.7,
        reset_expires_at: row.8,
        created_at: row.9,
        updated_at: row.10,
    }
}

impl PostgresStorage {
    async fn find_user_where(&self, condition: &str, value: &str) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {condition} = $1");
        let row: Option<UserTuple> = query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(row.map(from_tuple))
    }
}

#[async_trait]
impl UserStorage for PostgresStorage {
    async fn create_user(&self, user: &User) -> StorageResult<()> {
        query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_verified,
                               verification_code, verification_expires_at,
                               reset_token_hash, reset_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verification_code)
        .bind(user.verification_expires_at)
        .bind(&user.reset_token_hash)
        .bind(user.reset_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(PostgresError::from)?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserTuple> = query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PostgresError::from)?;
        Ok(row.map(from_tuple))
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.find_user_where("email", email).await
    }

    async fn find_user_by_reset_token(&self, token_hash: &str) -> StorageResult<Option<User>> {
        self.find_user_where("reset_token_hash", token_hash).await
    }

    async fn update_user(&self, user: &User) -> StorageResult<()> {
        let result = query(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = $4,
                is_verified = $5,
                verification_code = $6,
                verification_expires_at = $7,
                reset_token_hash = $8,
                reset_expires_at = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verification_code)
        .bind(user.verification_expires_at)
        .bind(&user.reset_token_hash)
        .bind(user.reset_expires_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(PostgresError::from)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found("User", user.id));
        }
        Ok(())
    }
}
