pub mod books;
pub mod requests;
pub mod reviews;
pub mod users;
