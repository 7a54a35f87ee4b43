use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{FromRow, PgPool};

use crate::circulation::repository::{NewBookRequest, RequestRepository};
use crate::core::AppError;
use crate::models::requests::{BookRequest, RequestStatus};

pub struct PgRequestStore {
    pool: PgPool,
}

impl PgRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RequestRow {
    id: i32,
    user_id: i32,
    book_id: i32,
    status: String,
    requested_at: NaiveDateTime,
    due_date: Option<NaiveDateTime>,
    returned_at: Option<NaiveDateTime>,
    copy_id: Option<String>,
}

impl TryFrom<RequestRow> for BookRequest {
    type Error = AppError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::from_str(&row.status).map_err(AppError::internal_error)?;
        Ok(BookRequest {
            id: row.id,
            user_id: row.user_id,
            book_id: row.book_id,
            status,
            requested_at: row.requested_at,
            due_date: row.due_date,
            returned_at: row.returned_at,
            copy_id: row.copy_id,
        })
    }
}

const REQUEST_COLUMNS: &str =
    "id, user_id, book_id, status, requested_at, due_date, returned_at, copy_id";

#[async_trait]
impl RequestRepository for PgRequestStore {
    async fn insert_request(&self, request: NewBookRequest) -> Result<BookRequest, AppError> {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO book_requests (user_id, book_id, status, requested_at, due_date, copy_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(request.user_id)
        .bind(request.book_id)
        .bind(request.status.as_str())
        .bind(request.requested_at)
        .bind(request.due_date)
        .bind(&request.copy_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(BookRequest {
            id,
            user_id: request.user_id,
            book_id: request.book_id,
            status: request.status,
            requested_at: request.requested_at,
            due_date: request.due_date,
            returned_at: None,
            copy_id: request.copy_id,
        })
    }

    async fn fetch_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM book_requests WHERE id = $1",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found(format!("Request {} not found", request_id)))?;

        row.try_into()
    }

    async fn update_request(&self, request: &BookRequest) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE book_requests
            SET status = $1, due_date = $2, returned_at = $3, copy_id = $4
            WHERE id = $5
            "#,
        )
        .bind(request.status.as_str())
        .bind(request.due_date)
        .bind(request.returned_at)
        .bind(&request.copy_id)
        .bind(request.id)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        if result.rows_affected() != 1 {
            return Err(AppError::not_found(format!(
                "Request {} not found",
                request.id
            )));
        }
        Ok(())
    }

    async fn list_pending_requests(&self) -> Result<Vec<BookRequest>, AppError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM book_requests WHERE status = 'pending' ORDER BY requested_at",
            REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        rows.into_iter().map(BookRequest::try_from).collect()
    }

    async fn list_requests_for_user(&self, user_id: i32) -> Result<Vec<BookRequest>, AppError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {} FROM book_requests WHERE user_id = $1 ORDER BY requested_at DESC",
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        rows.into_iter().map(BookRequest::try_from).collect()
    }
}
