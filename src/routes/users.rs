use crate::circulation::CirculationManager;
use crate::core::jwt_auth::JwtClaims;
use crate::core::{AppError, AppSuccessResponse};
use actix_web::{get, web, HttpResponse, Result};

#[tracing::instrument(name = "Get Profile", skip(manager, claims))]
#[get("/me")]
pub async fn get_profile(
    manager: web::Data<CirculationManager>,
    claims: JwtClaims,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    let user = manager.get_user(user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: user,
        message: "Profile retrieved successfully".to_string(),
    }))
}
