//! In-memory repositories so the managers unit-test without a database.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::AppError;
use crate::models::books::{Book, BookSummary};
use crate::models::requests::BookRequest;
use crate::models::reviews::{Review, ReviewStatus};
use crate::models::users::{Role, User};

use super::inventory::CopySet;
use super::repository::{
    BookRepository, CopyRecord, NewBookRequest, NewReview, RequestRepository, ReviewRepository,
    UserRepository,
};

#[derive(Default)]
pub struct MemoryStore {
    books: Mutex<HashMap<i32, Book>>,
    copy_owner: Mutex<HashMap<String, i32>>,
    requests: Mutex<HashMap<i32, BookRequest>>,
    users: Mutex<HashMap<i32, User>>,
    reviews: Mutex<HashMap<i32, Review>>,
    next_request_id: AtomicI32,
    next_review_id: AtomicI32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_request_id: AtomicI32::new(1),
            next_review_id: AtomicI32::new(1),
            ..Self::default()
        }
    }

    pub fn add_book(&self, id: i32, title: &str, author: &str, category: &str, copies: &[&str]) {
        let mut owners = self.copy_owner.lock().unwrap();
        for copy in copies {
            owners.insert(copy.to_string(), id);
        }
        self.books.lock().unwrap().insert(
            id,
            Book {
                id,
                title: title.to_string(),
                author: author.to_string(),
                category: category.to_string(),
                total_count: copies.len() as i32,
                available_count: copies.len() as i32,
                available_copies: CopySet::new(copies.iter().map(|c| c.to_string())),
            },
        );
    }

    pub fn add_user(&self, id: i32, name: &str, role: Role) {
        self.users.lock().unwrap().insert(
            id,
            User {
                id,
                name: name.to_string(),
                role,
                coins: 0,
            },
        );
    }

    pub fn user_coins(&self, user_id: i32) -> i64 {
        self.users.lock().unwrap()[&user_id].coins
    }
}

#[async_trait]
impl BookRepository for MemoryStore {
    async fn fetch_book(&self, book_id: i32) -> Result<Book, AppError> {
        self.books
            .lock()
            .unwrap()
            .get(&book_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", book_id)))
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>, AppError> {
        let mut summaries: Vec<BookSummary> = self
            .books
            .lock()
            .unwrap()
            .values()
            .map(|book| BookSummary {
                id: book.id,
                title: book.title.clone(),
                author: book.author.clone(),
                category: book.category.clone(),
                total_count: book.total_count,
                available_count: book.available_count,
            })
            .collect();
        summaries.sort_by_key(|b| b.id);
        Ok(summaries)
    }

    async fn allocate_copy(&self, book_id: i32) -> Result<Option<String>, AppError> {
        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(&book_id)
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", book_id)))?;

        Ok(book.available_copies.take().map(|copy_id| {
            book.available_count -= 1;
            copy_id
        }))
    }

    async fn claim_copy(&self, copy_id: &str) -> Result<bool, AppError> {
        let owner = self
            .copy_owner
            .lock()
            .unwrap()
            .get(copy_id)
            .copied()
            .ok_or_else(|| AppError::not_found(format!("Copy '{}' not found", copy_id)))?;

        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(&owner)
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", owner)))?;

        if book.available_copies.take_exact(copy_id) {
            book.available_count -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn find_copy(&self, copy_id: &str) -> Result<Option<CopyRecord>, AppError> {
        let owner = match self.copy_owner.lock().unwrap().get(copy_id).copied() {
            Some(owner) => owner,
            None => return Ok(None),
        };
        let books = self.books.lock().unwrap();
        let book = books
            .get(&owner)
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", owner)))?;

        Ok(Some(CopyRecord {
            copy_id: copy_id.to_string(),
            book_id: owner,
            is_available: book.available_copies.contains(copy_id),
        }))
    }

    async fn restore_copy(&self, book_id: i32, copy_id: &str) -> Result<(), AppError> {
        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(&book_id)
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", book_id)))?;

        if !book.available_copies.give(copy_id.to_string()) {
            return Err(AppError::internal_error(format!(
                "Copy '{}' restored while already free",
                copy_id
            )));
        }
        book.available_count += 1;
        Ok(())
    }
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn insert_request(&self, request: NewBookRequest) -> Result<BookRequest, AppError> {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let stored = BookRequest {
            id,
            user_id: request.user_id,
            book_id: request.book_id,
            status: request.status,
            requested_at: request.requested_at,
            due_date: request.due_date,
            returned_at: None,
            copy_id: request.copy_id,
        };
        self.requests.lock().unwrap().insert(id, stored.clone());
        Ok(stored)
    }

    async fn fetch_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        self.requests
            .lock()
            .unwrap()
            .get(&request_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Request {} not found", request_id)))
    }

    async fn update_request(&self, request: &BookRequest) -> Result<(), AppError> {
        let mut requests = self.requests.lock().unwrap();
        if !requests.contains_key(&request.id) {
            return Err(AppError::not_found(format!(
                "Request {} not found",
                request.id
            )));
        }
        requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn list_pending_requests(&self) -> Result<Vec<BookRequest>, AppError> {
        let mut pending: Vec<BookRequest> = self
            .requests
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == crate::models::requests::RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.id);
        Ok(pending)
    }

    async fn list_requests_for_user(&self, user_id: i32) -> Result<Vec<BookRequest>, AppError> {
        let mut mine: Vec<BookRequest> = self
            .requests
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by_key(|r| r.id);
        Ok(mine)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn fetch_user(&self, user_id: i32) -> Result<User, AppError> {
        self.users
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user_id)))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError> {
        let id = self.next_review_id.fetch_add(1, Ordering::SeqCst);
        let stored = Review {
            id,
            user_id: review.user_id,
            book_id: review.book_id,
            kind: review.kind,
            content: review.content,
            rating: review.rating,
            status: ReviewStatus::Pending,
            coin_award: review.coin_award,
            submitted_at: review.submitted_at,
        };
        self.reviews.lock().unwrap().insert(id, stored.clone());
        Ok(stored)
    }

    async fn fetch_review(&self, review_id: i32) -> Result<Review, AppError> {
        self.reviews
            .lock()
            .unwrap()
            .get(&review_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Review {} not found", review_id)))
    }

    async fn set_review_status(
        &self,
        review_id: i32,
        status: ReviewStatus,
    ) -> Result<(), AppError> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .get_mut(&review_id)
            .ok_or_else(|| AppError::not_found(format!("Review {} not found", review_id)))?;
        review.status = status;
        Ok(())
    }

    async fn approve_and_credit(&self, review_id: i32) -> Result<bool, AppError> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews
            .get_mut(&review_id)
            .ok_or_else(|| AppError::not_found(format!("Review {} not found", review_id)))?;
        if review.status != ReviewStatus::Pending {
            return Ok(false);
        }

        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&review.user_id)
            .ok_or_else(|| AppError::not_found(format!("User {} not found", review.user_id)))?;

        review.status = ReviewStatus::Approved;
        user.coins += review.coin_award;
        Ok(true)
    }

    async fn list_pending_reviews(&self) -> Result<Vec<Review>, AppError> {
        let mut pending: Vec<Review> = self
            .reviews
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.id);
        Ok(pending)
    }
}

/// Delegates to a [`MemoryStore`] but fails the next write when armed, so
/// tests can exercise the recovery paths around a storage outage.
pub struct UnreliableRequestStore {
    inner: Arc<MemoryStore>,
    fail_next_insert: AtomicBool,
    fail_next_update: AtomicBool,
}

impl UnreliableRequestStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_next_insert: AtomicBool::new(false),
            fail_next_update: AtomicBool::new(false),
        }
    }

    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RequestRepository for UnreliableRequestStore {
    async fn insert_request(&self, request: NewBookRequest) -> Result<BookRequest, AppError> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(AppError::db_error("connection reset"));
        }
        self.inner.insert_request(request).await
    }

    async fn fetch_request(&self, request_id: i32) -> Result<BookRequest, AppError> {
        self.inner.fetch_request(request_id).await
    }

    async fn update_request(&self, request: &BookRequest) -> Result<(), AppError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Err(AppError::db_error("connection reset"));
        }
        self.inner.update_request(request).await
    }

    async fn list_pending_requests(&self) -> Result<Vec<BookRequest>, AppError> {
        self.inner.list_pending_requests().await
    }

    async fn list_requests_for_user(&self, user_id: i32) -> Result<Vec<BookRequest>, AppError> {
        self.inner.list_requests_for_user(user_id).await
    }
}

/// Same idea for the review side: the next approval fails when armed.
pub struct UnreliableReviewStore {
    inner: Arc<MemoryStore>,
    fail_next_approval: AtomicBool,
}

impl UnreliableReviewStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fail_next_approval: AtomicBool::new(false),
        }
    }

    pub fn fail_next_approval(&self) {
        self.fail_next_approval.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReviewRepository for UnreliableReviewStore {
    async fn insert_review(&self, review: NewReview) -> Result<Review, AppError> {
        self.inner.insert_review(review).await
    }

    async fn fetch_review(&self, review_id: i32) -> Result<Review, AppError> {
        self.inner.fetch_review(review_id).await
    }

    async fn set_review_status(
        &self,
        review_id: i32,
        status: ReviewStatus,
    ) -> Result<(), AppError> {
        self.inner.set_review_status(review_id, status).await
    }

    async fn approve_and_credit(&self, review_id: i32) -> Result<bool, AppError> {
        if self.fail_next_approval.swap(false, Ordering::SeqCst) {
            return Err(AppError::db_error("connection reset"));
        }
        self.inner.approve_and_credit(review_id).await
    }

    async fn list_pending_reviews(&self) -> Result<Vec<Review>, AppError> {
        self.inner.list_pending_reviews().await
    }
}
