use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Utc};

use crate::core::AppError;
use crate::models::books::{Book, BookSummary};
use crate::models::requests::{BookRequest, RequestStatus};
use crate::models::users::User;

use super::repository::{BookRepository, NewBookRequest, RequestRepository, UserRepository};

/// Fixed loan period. Computed once at issuance, never recalculated.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// Owns the lifecycle of a book request from creation through issuance to
/// return, plus the copy-inventory side effects. Holds no state of its
/// own; everything flows through the injected repositories.
pub struct CirculationManager {
    books: Arc<dyn BookRepository>,
    requests: Arc<dyn RequestRepository>,
    users: Arc<dyn UserRepository>,
}

impl CirculationManager {
    pub fn new(
        books: Arc<dyn BookRepository>,
        requests: Arc<dyn RequestRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            books,
            requests,
            users,
        }
    }

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    pub async fn get_book(&self, book_id: i32) -> Result<Book, AppError> {
        self.books.fetch_book(book_id).await
    }

    pub async fn list_books(&self) -> Result<Vec<BookSummary>, AppError> {
        self.books.list_books().await
    }

    pub async fn get_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        self.requests.fetch_request(request_id).await
    }

    pub async fn list_pending_requests(&self) -> Result<Vec<BookRequest>, AppError> {
        self.requests.list_pending_requests().await
    }

    pub async fn list_requests_for_user(&self, user_id: i32) -> Result<Vec<BookRequest>, AppError> {
        self.requests.list_requests_for_user(user_id).await
    }

    /// Creates a `pending` borrow request. First phase of the two-phase
    /// availability check: creation refuses a book with nothing free, and
    /// approval re-checks because availability can change in between.
    pub async fn create_request(
        &self,
        user_id: i32,
        book_id: i32,
    ) -> Result<BookRequest, AppError> {
        let user = self.users.fetch_user(user_id).await?;
        let book = self.books.fetch_book(book_id).await?;

        if book.available_count == 0 {
            return Err(AppError::no_copy_available(format!(
                "No copies of '{}' are currently available",
                book.title
            )));
        }

        self.requests
            .insert_request(NewBookRequest {
                user_id: user.id,
                book_id: book.id,
                status: RequestStatus::Pending,
                requested_at: Self::now(),
                due_date: None,
                copy_id: None,
            })
            .await
    }

    /// Issues a copy for a `pending` request: allocates the lowest free
    /// copy id, stamps the due date, moves to `approved`. Availability is
    /// re-checked here; the allocation is atomic in the repository, so of
    /// two approvals racing on the last copy exactly one succeeds.
    pub async fn approve_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let mut request = self.requests.fetch_request(request_id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::invalid_transition(format!(
                "Cannot approve a request in status '{}'",
                request.status.as_str()
            )));
        }

        let copy_id = self
            .books
            .allocate_copy(request.book_id)
            .await?
            .ok_or_else(|| {
                AppError::no_copy_available("No copy available at approval time")
            })?;

        request.status = RequestStatus::Approved;
        request.copy_id = Some(copy_id.clone());
        request.due_date = Some(Self::now() + Duration::days(LOAN_PERIOD_DAYS));

        // If the request write fails the allocation must be undone, or the
        // copy stays checked out with no loan recording it.
        if let Err(err) = self.requests.update_request(&request).await {
            self.release_copy(request.book_id, &copy_id).await;
            return Err(err);
        }
        Ok(request)
    }

    /// Hands a copy back after a failed write. Restore failure is logged
    /// rather than propagated: the original error is the one to surface.
    async fn release_copy(&self, book_id: i32, copy_id: &str) {
        if let Err(err) = self.books.restore_copy(book_id, copy_id).await {
            tracing::error!(
                error.cause_chain = ?err,
                "Copy '{}' of book {} stranded after a failed request write",
                copy_id,
                book_id
            );
        }
    }

    /// Terminal rejection of a `pending` request. No inventory effect.
    pub async fn reject_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let mut request = self.requests.fetch_request(request_id).await?;

        if request.status != RequestStatus::Pending {
            return Err(AppError::invalid_transition(format!(
                "Cannot reject a request in status '{}'",
                request.status.as_str()
            )));
        }

        request.status = RequestStatus::Rejected;
        self.requests.update_request(&request).await?;
        Ok(request)
    }

    /// Student claims the book is coming back. The copy stays checked out
    /// until an admin confirms; a claimed return is not a return.
    pub async fn request_return(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let mut request = self.requests.fetch_request(request_id).await?;

        if request.status != RequestStatus::Approved {
            return Err(AppError::invalid_transition(format!(
                "Cannot request return for a request in status '{}'",
                request.status.as_str()
            )));
        }

        request.status = RequestStatus::ReturnRequested;
        self.requests.update_request(&request).await?;
        Ok(request)
    }

    /// Admin confirms the physical return: the assigned copy goes back
    /// into the book's free set and the request terminates as `returned`.
    pub async fn confirm_return(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let mut request = self.requests.fetch_request(request_id).await?;

        if request.status != RequestStatus::ReturnRequested {
            return Err(AppError::invalid_transition(format!(
                "Cannot confirm return for a request in status '{}'",
                request.status.as_str()
            )));
        }

        let copy_id = request.copy_id.clone().ok_or_else(|| {
            AppError::internal_error("Issued request has no assigned copy id")
        })?;

        self.books.restore_copy(request.book_id, &copy_id).await?;

        request.status = RequestStatus::Returned;
        request.returned_at = Some(Self::now());

        // Undo the restore on a failed write, or a later retry would put
        // the same copy back into the free set twice.
        if let Err(err) = self.requests.update_request(&request).await {
            if let Err(claim_err) = self.books.claim_copy(&copy_id).await {
                tracing::error!(
                    error.cause_chain = ?claim_err,
                    "Copy '{}' left free after a failed return write",
                    copy_id
                );
            }
            return Err(err);
        }
        Ok(request)
    }

    /// Admin denies the claimed return; the request reverts to `approved`
    /// and the copy remains checked out.
    pub async fn deny_return(&self, request_id: i32) -> Result<BookRequest, AppError> {
        let mut request = self.requests.fetch_request(request_id).await?;

        if request.status != RequestStatus::ReturnRequested {
            return Err(AppError::invalid_transition(format!(
                "Cannot deny return for a request in status '{}'",
                request.status.as_str()
            )));
        }

        request.status = RequestStatus::Approved;
        self.requests.update_request(&request).await?;
        Ok(request)
    }

    /// Administrative bypass: hand a named copy straight to a student.
    /// Performs the same inventory mutation as approval and records a
    /// request born in `approved` state.
    pub async fn manual_issue(
        &self,
        copy_id: &str,
        student_id: i32,
    ) -> Result<BookRequest, AppError> {
        let record = self
            .books
            .find_copy(copy_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Copy '{}' not found", copy_id)))?;

        let user = self.users.fetch_user(student_id).await?;

        if !record.is_available {
            return Err(AppError::already_issued(format!(
                "Copy '{}' is already issued",
                copy_id
            )));
        }

        // Re-checked atomically; the availability read above can go stale.
        if !self.books.claim_copy(copy_id).await? {
            return Err(AppError::already_issued(format!(
                "Copy '{}' is already issued",
                copy_id
            )));
        }

        let now = Self::now();
        let inserted = self
            .requests
            .insert_request(NewBookRequest {
                user_id: user.id,
                book_id: record.book_id,
                status: RequestStatus::Approved,
                requested_at: now,
                due_date: Some(now + Duration::days(LOAN_PERIOD_DAYS)),
                copy_id: Some(copy_id.to_string()),
            })
            .await;

        match inserted {
            Ok(request) => Ok(request),
            Err(err) => {
                // same rule as approval: no loan row, no claimed copy
                self.release_copy(record.book_id, copy_id).await;
                Err(err)
            }
        }
    }

    pub async fn get_user(&self, user_id: i32) -> Result<User, AppError> {
        self.users.fetch_user(user_id).await
    }
}
