use crate::circulation::CirculationManager;
use crate::core::jwt_auth::JwtClaims;
use crate::core::{AppError, AppErrorResponse, AppSuccessResponse};
use crate::models::requests::{BookRequestView, ManualIssuePayload};
use actix_web::{get, post, put, web, HttpResponse, Result};
use chrono::Utc;

fn require_admin(claims: &JwtClaims) -> Option<HttpResponse> {
    if claims.role != "admin" {
        return Some(HttpResponse::Forbidden().json(AppErrorResponse {
            success: false,
            message: "Access denied. Admin role required.".to_string(),
        }));
    }
    None
}

#[tracing::instrument(name = "Get Pending Requests", skip(manager, claims))]
#[get("/requests/pending")]
pub async fn get_pending_requests(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let pending = manager.list_pending_requests().await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: pending,
        message: "Pending requests retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Approve Request", skip(manager, claims))]
#[put("/requests/{request_id}/approve")]
pub async fn approve_request(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let request = manager.approve_request(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: BookRequestView::at(request, Utc::now().naive_utc()),
        message: "Request approved and copy issued".to_string(),
    }))
}

#[tracing::instrument(name = "Reject Request", skip(manager, claims))]
#[put("/requests/{request_id}/reject")]
pub async fn reject_request(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let request = manager.reject_request(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: request,
        message: "Request rejected".to_string(),
    }))
}

#[tracing::instrument(name = "Confirm Return", skip(manager, claims))]
#[put("/returns/{request_id}/confirm")]
pub async fn confirm_return(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let request = manager.confirm_return(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: request,
        message: "Return confirmed and copy restored".to_string(),
    }))
}

#[tracing::instrument(name = "Deny Return", skip(manager, claims))]
#[put("/returns/{request_id}/deny")]
pub async fn deny_return(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let request = manager.deny_return(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: request,
        message: "Return denied; the book remains checked out".to_string(),
    }))
}

#[tracing::instrument(name = "Manual Issue", skip(manager, claims, payload))]
#[post("/issues")]
pub async fn manual_issue(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
    payload: web::Json<ManualIssuePayload>,
) -> Result<HttpResponse, AppError> {
    if let Some(forbidden) = require_admin(&claims) {
        return Ok(forbidden);
    }

    let request = manager
        .manual_issue(&payload.copy_id, payload.student_id)
        .await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse {
        success: true,
        data: BookRequestView::at(request, Utc::now().naive_utc()),
        message: "Copy issued manually".to_string(),
    }))
}
