use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    ReturnRequested,
    Returned,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::ReturnRequested => "return_requested",
            Self::Returned => "returned",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "return_requested" => Ok(Self::ReturnRequested),
            "returned" => Ok(Self::Returned),
            other => Err(format!("Invalid request status: {}", other)),
        }
    }
}

/// One borrow request, from creation through issuance to return.
/// Never deleted; only its status and issuance fields move.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookRequest {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub status: RequestStatus,
    pub requested_at: NaiveDateTime,
    pub due_date: Option<NaiveDateTime>,
    pub returned_at: Option<NaiveDateTime>,
    pub copy_id: Option<String>,
}

impl BookRequest {
    /// Overdue is derived on every read, never stored. A request is overdue
    /// strictly after its due instant; at exactly the due instant it is not.
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        match (self.status, self.due_date) {
            (RequestStatus::Approved, Some(due)) => now > due,
            _ => false,
        }
    }
}

/// `BookRequest` as surfaced to callers, with the derived overdue flag.
#[derive(Debug, Serialize)]
pub struct BookRequestView {
    #[serde(flatten)]
    pub request: BookRequest,
    pub overdue: bool,
}

impl BookRequestView {
    pub fn at(request: BookRequest, now: NaiveDateTime) -> Self {
        let overdue = request.is_overdue(now);
        Self { request, overdue }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequestPayload {
    pub book_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ManualIssuePayload {
    pub copy_id: String,
    pub student_id: i32,
}
