use std::sync::Arc;

use chrono::Utc;

use crate::core::AppError;
use crate::models::reviews::{Review, ReviewKind, ReviewStatus};

use super::repository::{NewReview, ReviewRepository, UserRepository};

/// Review approval and the coin ledger. The award amount is frozen on the
/// review at submission; approval credits it to the submitter exactly
/// once. Coins are never decremented here.
pub struct ReviewLedger {
    reviews: Arc<dyn ReviewRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReviewLedger {
    pub fn new(reviews: Arc<dyn ReviewRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { reviews, users }
    }

    pub async fn get_review(&self, review_id: i32) -> Result<Review, AppError> {
        self.reviews.fetch_review(review_id).await
    }

    pub async fn list_pending_reviews(&self) -> Result<Vec<Review>, AppError> {
        self.reviews.list_pending_reviews().await
    }

    pub async fn submit_review(
        &self,
        user_id: i32,
        book_id: i32,
        kind: ReviewKind,
        content: String,
        rating: Option<i32>,
    ) -> Result<Review, AppError> {
        let user = self.users.fetch_user(user_id).await?;

        match (kind, rating) {
            (ReviewKind::Summary, Some(_)) => {
                return Err(AppError::bad_request("A summary does not carry a rating"));
            }
            (ReviewKind::Review, Some(rating)) if !(1..=5).contains(&rating) => {
                return Err(AppError::bad_request("Rating must be between 1 and 5"));
            }
            _ => {}
        }

        if content.trim().is_empty() {
            return Err(AppError::bad_request("Review content must not be empty"));
        }

        self.reviews
            .insert_review(NewReview {
                user_id: user.id,
                book_id,
                kind,
                content,
                rating,
                coin_award: kind.coin_award(),
                submitted_at: Utc::now().naive_utc(),
            })
            .await
    }

    /// Approves a `pending` review and credits its frozen award. A review
    /// that already left `pending` is refused outright so a repeated
    /// approval can never credit twice. The status flip and the credit are
    /// one atomic repository operation: if either side fails the review
    /// stays pending and the approval can simply be retried.
    pub async fn approve_review(&self, review_id: i32) -> Result<Review, AppError> {
        let mut review = self.reviews.fetch_review(review_id).await?;

        if review.status != ReviewStatus::Pending {
            return Err(AppError::already_processed(format!(
                "Review is already '{}'",
                review.status.as_str()
            )));
        }

        if !self.reviews.approve_and_credit(review.id).await? {
            // lost a race with another approval; the credit went with it
            return Err(AppError::already_processed(
                "Review is already processed",
            ));
        }

        review.status = ReviewStatus::Approved;
        Ok(review)
    }

    /// Rejects a `pending` review. No credit, ever.
    pub async fn reject_review(&self, review_id: i32) -> Result<Review, AppError> {
        let mut review = self.reviews.fetch_review(review_id).await?;

        if review.status != ReviewStatus::Pending {
            return Err(AppError::already_processed(format!(
                "Review is already '{}'",
                review.status.as_str()
            )));
        }

        self.reviews
            .set_review_status(review.id, ReviewStatus::Rejected)
            .await?;

        review.status = ReviewStatus::Rejected;
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circulation::testing::{MemoryStore, UnreliableReviewStore};
    use crate::core::AppErrorType;
    use crate::models::reviews::{REVIEW_AWARD, SUMMARY_AWARD};
    use crate::models::users::Role;
    use claims::{assert_err, assert_ok};

    fn ledger_with(store: Arc<MemoryStore>) -> ReviewLedger {
        ReviewLedger::new(store.clone(), store)
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.add_user(1, "Sana", Role::Student);
        store.add_book(10, "Dune", "Frank Herbert", "sci-fi", &["DUN-1"]);
        Arc::new(store)
    }

    #[tokio::test]
    async fn submitted_review_is_pending_with_frozen_award() {
        let store = seeded_store();
        let ledger = ledger_with(store.clone());

        let review = assert_ok!(
            ledger
                .submit_review(1, 10, ReviewKind::Review, "Loved it".into(), Some(5))
                .await
        );
        assert_eq!(review.status, ReviewStatus::Pending);
        assert_eq!(review.coin_award, REVIEW_AWARD);

        // nothing credited until approval
        assert_eq!(store.user_coins(1), 0);
    }

    #[tokio::test]
    async fn approving_a_review_credits_five_coins_once() {
        let store = seeded_store();
        let ledger = ledger_with(store.clone());

        let review = ledger
            .submit_review(1, 10, ReviewKind::Review, "Loved it".into(), Some(4))
            .await
            .unwrap();

        let approved = assert_ok!(ledger.approve_review(review.id).await);
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert_eq!(store.user_coins(1), REVIEW_AWARD);

        let err = assert_err!(ledger.approve_review(review.id).await);
        assert_eq!(err.error_type, AppErrorType::AlreadyProcessed);
        assert_eq!(store.user_coins(1), REVIEW_AWARD);
    }

    #[tokio::test]
    async fn failed_approval_write_leaves_the_credit_claimable() {
        let store = seeded_store();
        let reviews = Arc::new(UnreliableReviewStore::new(store.clone()));
        let ledger = ReviewLedger::new(reviews.clone(), store.clone());

        let review = ledger
            .submit_review(1, 10, ReviewKind::Review, "Loved it".into(), Some(5))
            .await
            .unwrap();

        reviews.fail_next_approval();
        let err = assert_err!(ledger.approve_review(review.id).await);
        assert_eq!(err.error_type, AppErrorType::DbError);

        // neither half landed: still pending, nothing credited
        assert_eq!(store.user_coins(1), 0);
        let stored = store.fetch_review(review.id).await.unwrap();
        assert_eq!(stored.status, ReviewStatus::Pending);

        // so the approval retries cleanly and credits exactly once
        let approved = assert_ok!(ledger.approve_review(review.id).await);
        assert_eq!(approved.status, ReviewStatus::Approved);
        assert_eq!(store.user_coins(1), REVIEW_AWARD);
    }

    #[tokio::test]
    async fn approving_a_summary_credits_fifteen_coins() {
        let store = seeded_store();
        let ledger = ledger_with(store.clone());

        let review = ledger
            .submit_review(1, 10, ReviewKind::Summary, "Chapter one...".into(), None)
            .await
            .unwrap();
        assert_eq!(review.coin_award, SUMMARY_AWARD);

        ledger.approve_review(review.id).await.unwrap();
        assert_eq!(store.user_coins(1), SUMMARY_AWARD);
    }

    #[tokio::test]
    async fn rejected_review_never_credits() {
        let store = seeded_store();
        let ledger = ledger_with(store.clone());

        let review = ledger
            .submit_review(1, 10, ReviewKind::Review, "Meh".into(), Some(2))
            .await
            .unwrap();

        let rejected = assert_ok!(ledger.reject_review(review.id).await);
        assert_eq!(rejected.status, ReviewStatus::Rejected);
        assert_eq!(store.user_coins(1), 0);

        // a rejected review cannot be revived into a credit
        let err = assert_err!(ledger.approve_review(review.id).await);
        assert_eq!(err.error_type, AppErrorType::AlreadyProcessed);
        assert_eq!(store.user_coins(1), 0);
    }

    #[tokio::test]
    async fn summary_with_rating_is_refused() {
        let store = seeded_store();
        let ledger = ledger_with(store);

        let err = assert_err!(
            ledger
                .submit_review(1, 10, ReviewKind::Summary, "Chapter one...".into(), Some(3))
                .await
        );
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_refused() {
        let store = seeded_store();
        let ledger = ledger_with(store);

        let err = assert_err!(
            ledger
                .submit_review(1, 10, ReviewKind::Review, "Ok".into(), Some(6))
                .await
        );
        assert_eq!(err.error_type, AppErrorType::PayloadValidationError);
    }
}
