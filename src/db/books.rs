use async_trait::async_trait;
use sqlx::PgPool;

use crate::circulation::inventory::CopySet;
use crate::circulation::repository::{BookRepository, CopyRecord};
use crate::core::AppError;
use crate::models::books::{Book, BookSummary};

/// The `book_copies` table is the source of truth for availability;
/// counts are always derived from it, never stored alongside.
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for PgBookStore {
    async fn fetch_book(&self, book_id: i32) -> Result<Book, AppError> {
        let row = sqlx::query_as::<_, (i32, String, String, String, i32)>(
            "SELECT id, title, author, category, total_count FROM books WHERE id = $1",
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?
        .ok_or_else(|| AppError::not_found(format!("Book {} not found", book_id)))?;

        let free_ids: Vec<String> = sqlx::query_scalar(
            "SELECT copy_id FROM book_copies WHERE book_id = $1 AND is_available ORDER BY copy_id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        let (id, title, author, category, total_count) = row;
        Ok(Book {
            id,
            title,
            author,
            category,
            total_count,
            available_count: free_ids.len() as i32,
            available_copies: CopySet::new(free_ids),
        })
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>, AppError> {
        let books = sqlx::query_as::<_, BookSummary>(
            r#"
            SELECT b.id, b.title, b.author, b.category, b.total_count,
                   COALESCE(COUNT(c.copy_id) FILTER (WHERE c.is_available), 0)::INT4 AS available_count
            FROM books b
            LEFT JOIN book_copies c ON c.book_id = b.id
            GROUP BY b.id
            ORDER BY b.title
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(books)
    }

    async fn allocate_copy(&self, book_id: i32) -> Result<Option<String>, AppError> {
        let mut db_transaction = self.pool.begin().await.map_err(AppError::db_error)?;

        // Row lock on the chosen copy; a racing allocation skips it and
        // takes the next one, or comes up empty.
        let copy_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT copy_id FROM book_copies
            WHERE book_id = $1 AND is_available
            ORDER BY copy_id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(book_id)
        .fetch_optional(db_transaction.as_mut())
        .await
        .map_err(AppError::db_error)?;

        let copy_id = match copy_id {
            Some(copy_id) => copy_id,
            None => {
                db_transaction.rollback().await.map_err(AppError::db_error)?;
                return Ok(None);
            }
        };

        let result = sqlx::query(
            "UPDATE book_copies SET is_available = FALSE WHERE copy_id = $1 AND is_available",
        )
        .bind(&copy_id)
        .execute(db_transaction.as_mut())
        .await
        .map_err(AppError::db_error)?;

        if result.rows_affected() != 1 {
            db_transaction.rollback().await.map_err(AppError::db_error)?;
            return Err(AppError::internal_error(format!(
                "Copy '{}' vanished while locked",
                copy_id
            )));
        }

        db_transaction.commit().await.map_err(AppError::db_error)?;
        Ok(Some(copy_id))
    }

    async fn claim_copy(&self, copy_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE book_copies SET is_available = FALSE WHERE copy_id = $1 AND is_available",
        )
        .bind(copy_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_copy(&self, copy_id: &str) -> Result<Option<CopyRecord>, AppError> {
        let row = sqlx::query_as::<_, (String, i32, bool)>(
            "SELECT copy_id, book_id, is_available FROM book_copies WHERE copy_id = $1",
        )
        .bind(copy_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        Ok(row.map(|(copy_id, book_id, is_available)| CopyRecord {
            copy_id,
            book_id,
            is_available,
        }))
    }

    async fn restore_copy(&self, book_id: i32, copy_id: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE book_copies SET is_available = TRUE
            WHERE copy_id = $1 AND book_id = $2 AND NOT is_available
            "#,
        )
        .bind(copy_id)
        .bind(book_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::db_error)?;

        if result.rows_affected() != 1 {
            // already free or unknown: either way the inventory is corrupt
            return Err(AppError::internal_error(format!(
                "Copy '{}' could not be restored to book {}",
                copy_id, book_id
            )));
        }
        Ok(())
    }
}
