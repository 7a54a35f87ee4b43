mod books;
mod requests;
mod reviews;
mod users;

pub use books::PgBookStore;
pub use requests::PgRequestStore;
pub use reviews::PgReviewStore;
pub use users::PgUserStore;
