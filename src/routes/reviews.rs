use crate::circulation::ReviewLedger;
use crate::core::jwt_auth::JwtClaims;
use crate::core::{AppError, AppErrorResponse, AppSuccessResponse};
use crate::models::reviews::SubmitReviewPayload;
use actix_web::{get, post, put, web, HttpResponse, Result};

#[tracing::instrument(name = "Submit Review", skip(ledger, claims, payload))]
#[post("")]
pub async fn submit_review(
    ledger: web::Data<ReviewLedger>,
    claims: JwtClaims,
    payload: web::Json<SubmitReviewPayload>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let payload = payload.into_inner();

    let review = ledger
        .submit_review(
            user_id,
            payload.book_id,
            payload.kind,
            payload.content,
            payload.rating,
        )
        .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: review,
        message: "Review submitted. Coins are credited once an admin approves it.".to_string(),
    }))
}

#[tracing::instrument(name = "Get Pending Reviews", skip(ledger, claims))]
#[get("/pending")]
pub async fn get_pending_reviews(
    ledger: web::Data<ReviewLedger>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    if claims.role != "admin" {
        return Ok(HttpResponse::Forbidden().json(AppErrorResponse {
            success: false,
            message: "Access denied. Admin role required.".to_string(),
        }));
    }

    let pending = ledger.list_pending_reviews().await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: pending,
        message: "Pending reviews retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Approve Review", skip(ledger, claims))]
#[put("/{review_id}/approve")]
pub async fn approve_review(
    ledger: web::Data<ReviewLedger>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if claims.role != "admin" {
        return Ok(HttpResponse::Forbidden().json(AppErrorResponse {
            success: false,
            message: "Access denied. Admin role required.".to_string(),
        }));
    }

    let review = ledger.approve_review(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: review,
        message: "Review approved and coins credited".to_string(),
    }))
}

#[tracing::instrument(name = "Reject Review", skip(ledger, claims))]
#[put("/{review_id}/reject")]
pub async fn reject_review(
    ledger: web::Data<ReviewLedger>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if claims.role != "admin" {
        return Ok(HttpResponse::Forbidden().json(AppErrorResponse {
            success: false,
            message: "Access denied. Admin role required.".to_string(),
        }));
    }

    let review = ledger.reject_review(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: review,
        message: "Review rejected".to_string(),
    }))
}
