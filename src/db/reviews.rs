use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

use crate::circulation::repository::{NewReview, ReviewRepository};
use crate::core::AppError;
use crate::models::reviews::{Review, ReviewKind, ReviewStatus};

pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ReviewRow {
    id: i32,
    user_id: i32,
    book_id: i32,
    kind: String,
    content: String,
    rating: Option<i32>,
    status: String,
    coin_award: i64,
    submitted_at: NaiveDateTime,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            kind: ReviewKind::from_str(&row.kind).map_err(AppError::internal_error)?,
            content: row.content,
            rating: row.rating,
            status: ReviewStatus::from_str(&row.status).map_err(AppError::internal_error)?,
            coin_award: row.coin_award,
            submitted_at: row.submitted_at,
        })
    }
}

const REVIEW_COLUMNS: &str =
    "id, user_id, book_id, kind, content, rating, status, coin_award, submitted_at";

#[async_trait]
impl ReviewRepository for PgReviewStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (user_id, book_id, kind, content, rating, status, coin_award, submitted_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
            RETURNING id
            "#,
        )
        .bind(review.user_id)
        .bind(review.book_id)
        .bind(review.kind.as_str())
        .bind(&review.content)
        .bind(review.rating)
        .bind(review.coin_award)
        .bind(review.submitted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(Review {
            id,
            user_id: review.user_id,
            book_id: review.book_id,
            kind: review.kind,
            content: review.content,
            rating: review.rating,
            status: ReviewStatus::Pending,
            coin_award: review.coin_award,
            submitted_at: review.submitted_at,
        })
    }

    async fn fetch_review(&self, review_id: i32) -> Result<Review, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found(format!("Review {} not found", review_id)))?;

        row.try_into()
    }

    async fn set_review_status(
        &self,
        review_id: i32,
        status: ReviewStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE reviews SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::db_error)?;

        if result.rows_affected() != 1 {
            return Err(AppError::not_found(format!(
                "Review {} not found",
                review_id
            )));
        }
        Ok(())
    }

    // One transaction for the status flip and the credit: a failure on
    // either statement rolls back both, so the review stays pending and a
    // retry cannot credit twice. The guarded UPDATE doubles as the race
    // arbiter when two admins approve at once.
    async fn approve_and_credit(&self, review_id: i32) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::db_error)?;

        let flipped: Option<(i32, i64)> = sqlx::query_as(
            r#"
            UPDATE reviews
            SET status = 'approved'
            WHERE id = $1 AND status = 'pending'
            RETURNING user_id, coin_award
            "#,
        )
        .bind(review_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::db_error)?;

        let (user_id, coin_award) = match flipped {
            Some(row) => row,
            None => {
                tx.rollback().await.map_err(AppError::db_error)?;
                return Ok(false);
            }
        };

        let credited = sqlx::query("UPDATE users SET coins = coins + $1 WHERE id = $2")
            .bind(coin_award)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::db_error)?;

        if credited.rows_affected() != 1 {
            tx.rollback().await.map_err(AppError::db_error)?;
            return Err(AppError::not_found(format!("User {} not found", user_id)));
        }

        tx.commit().await.map_err(AppError::db_error)?;
        Ok(true)
    }

    async fn list_pending_reviews(&self) -> Result<Vec<Review>, AppError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {} FROM reviews WHERE status = 'pending' ORDER BY submitted_at",
            REVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        rows.into_iter().map(Review::try_from).collect()
    }
}
