use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::core::AppError;
use crate::models::books::{Book, BookSummary};
use crate::models::requests::{BookRequest, RequestStatus};
use crate::models::reviews::{Review, ReviewKind, ReviewStatus};
use crate::models::users::User;

/// A copy id resolved to its owning book, free or checked out.
#[derive(Debug, Clone)]
pub struct CopyRecord {
    pub copy_id: String,
    pub book_id: i32,
    pub is_available: bool,
}

#[derive(Debug, Clone)]
pub struct NewBookRequest {
    pub user_id: i32,
    pub book_id: i32,
    pub status: RequestStatus,
    pub requested_at: NaiveDateTime,
    pub due_date: Option<NaiveDateTime>,
    pub copy_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: i32,
    pub book_id: i32,
    pub kind: ReviewKind,
    pub content: String,
    pub rating: Option<i32>,
    pub coin_award: i64,
    pub submitted_at: NaiveDateTime,
}

/// Book inventory seam. `allocate_copy` and `claim_copy` are the only two
/// entry points that hand out copies, and each implementation must make
/// them atomic: two callers racing on the last free copy of a book get
/// exactly one success between them.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn fetch_book(&self, book_id: i32) -> Result<Book, AppError>;

    async fn list_books(&self) -> Result<Vec<BookSummary>, AppError>;

    /// Removes the lowest free copy id of the book and decrements its
    /// availability. `Ok(None)` when the free set is empty.
    async fn allocate_copy(&self, book_id: i32) -> Result<Option<String>, AppError>;

    /// Claims one specific copy id. `Ok(false)` when the copy exists but
    /// is already checked out.
    async fn claim_copy(&self, copy_id: &str) -> Result<bool, AppError>;

    /// Resolves a copy id to its owning book regardless of availability.
    async fn find_copy(&self, copy_id: &str) -> Result<Option<CopyRecord>, AppError>;

    /// Puts a checked-out copy back into the free set and increments
    /// availability. Restoring an id that is already free means the
    /// inventory is corrupt and must surface as an internal error.
    async fn restore_copy(&self, book_id: i32, copy_id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    async fn insert_request(&self, request: NewBookRequest) -> Result<BookRequest, AppError>;

    async fn fetch_request(&self, request_id: i32) -> Result<BookRequest, AppError>;

    async fn update_request(&self, request: &BookRequest) -> Result<(), AppError>;

    async fn list_pending_requests(&self) -> Result<Vec<BookRequest>, AppError>;

    async fn list_requests_for_user(&self, user_id: i32) -> Result<Vec<BookRequest>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn fetch_user(&self, user_id: i32) -> Result<User, AppError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError>;

    async fn fetch_review(&self, review_id: i32) -> Result<Review, AppError>;

    async fn set_review_status(
        &self,
        review_id: i32,
        status: ReviewStatus,
    ) -> Result<(), AppError>;

    /// Flips a `pending` review to `approved` and credits its frozen
    /// award to the submitter, as one atomic unit: a storage failure must
    /// leave the review pending and the balance untouched, so the
    /// approval can be retried without ever crediting twice.
    /// `Ok(false)` when the review was no longer pending.
    async fn approve_and_credit(&self, review_id: i32) -> Result<bool, AppError>;

    async fn list_pending_reviews(&self) -> Result<Vec<Review>, AppError>;
}
