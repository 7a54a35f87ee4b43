use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A plain review earns 5 coins on approval, a chapter summary 15.
pub const REVIEW_AWARD: i64 = 5;
pub const SUMMARY_AWARD: i64 = 15;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewKind {
    Review,
    Summary,
}

impl ReviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Summary => "summary",
        }
    }

    /// Award amount is fixed by kind at submission time.
    pub fn coin_award(&self) -> i64 {
        match self {
            Self::Review => REVIEW_AWARD,
            Self::Summary => SUMMARY_AWARD,
        }
    }
}

impl std::str::FromStr for ReviewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "review" => Ok(Self::Review),
            "summary" => Ok(Self::Summary),
            other => Err(format!("Invalid review kind: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("Invalid review status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Review {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub kind: ReviewKind,
    pub content: String,
    pub rating: Option<i32>,
    pub status: ReviewStatus,
    pub coin_award: i64,
    pub submitted_at: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SubmitReviewPayload {
    pub book_id: i32,
    pub kind: ReviewKind,
    pub content: String,
    pub rating: Option<i32>,
}
