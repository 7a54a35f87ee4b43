use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;

use admin::{
    approve_request, confirm_return, deny_return, get_pending_requests, manual_issue,
    reject_request,
};
use books::{get_book, list_books};
use requests::{create_book_request, get_my_requests, request_return};
use reviews::{approve_review, get_pending_reviews, reject_review, submit_review};
use users::get_profile;

mod admin;
mod books;
mod health_check;
mod requests;
mod reviews;
mod users;

use crate::routes::health_check::*;

fn books_routes() -> Scope {
    scope("books").service(list_books).service(get_book)
}

fn requests_routes() -> Scope {
    scope("requests")
        .service(get_my_requests)
        .service(create_book_request)
        .service(request_return)
}

fn admin_routes() -> Scope {
    scope("admin")
        .service(get_pending_requests)
        .service(approve_request)
        .service(reject_request)
        .service(confirm_return)
        .service(deny_return)
        .service(manual_issue)
}

fn users_routes() -> Scope {
    scope("users").service(get_profile)
}

fn reviews_routes() -> Scope {
    scope("reviews")
        .service(get_pending_reviews)
        .service(submit_review)
        .service(approve_review)
        .service(reject_review)
}

pub fn community_library_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(books_routes())
            .service(requests_routes())
            .service(admin_routes())
            .service(users_routes())
            .service(reviews_routes())
            .service(health_check),
    );
}
