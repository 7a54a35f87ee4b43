use std::str::FromStr;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::circulation::repository::UserRepository;
use crate::core::AppError;
use crate::models::users::{Role, User};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserStore {
    async fn fetch_user(&self, user_id: i32) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, (i32, String, String, i64)>(
            "SELECT id, name, role, coins FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", user_id)))?;

        let (id, name, role, coins) = row;
        Ok(User {
            id,
            name,
            role: Role::from_str(&role).map_err(AppError::internal_error)?,
            coins,
        })
    }
}
