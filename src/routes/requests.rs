use crate::circulation::CirculationManager;
use crate::core::jwt_auth::JwtClaims;
use crate::core::{AppError, AppSuccessResponse};
use crate::models::requests::{BookRequestView, CreateBookRequestPayload};
use actix_web::{get, post, web, HttpResponse, Result};
use chrono::Utc;

#[tracing::instrument(name = "Create Book Request", skip(manager, claims, payload))]
#[post("")]
pub async fn create_book_request(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    payload: web::Json<CreateBookRequestPayload>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let request = manager.create_request(user_id, payload.book_id).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: request,
        message: "Request created. Please wait for admin approval.".to_string(),
    }))
}

#[tracing::instrument(name = "Request Return", skip(manager, claims))]
#[post("/{request_id}/return")]
pub async fn request_return(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let request_id = path.into_inner();

    let request = manager.get_request(request_id).await?;
    if request.user_id != user_id {
        return Err(AppError::forbidden_error(
            "Only the borrower can request a return",
        ));
    }

    let request = manager.request_return(request_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: request,
        message: "Return requested. Please hand the book to the library desk.".to_string(),
    }))
}

#[tracing::instrument(name = "Get My Requests", skip(manager, claims))]
#[get("/mine")]
pub async fn get_my_requests(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let now = Utc::now().naive_utc();
    let requests: Vec<BookRequestView> = manager
        .list_requests_for_user(user_id)
        .await?
        .into_iter()
        .map(|request| BookRequestView::at(request, now))
        .collect();

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: requests,
        message: "Requests retrieved successfully".to_string(),
    }))
}
