use crate::circulation::CirculationManager;
use crate::core::{AppError, AppSuccessResponse};
use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

#[tracing::instrument(name = "List Books", skip(manager))]
#[get("")]
pub async fn list_books(
    manager: web::Data<CirculationManager>,
) -> Result<HttpResponse, AppError> {
    let books = manager.list_books().await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: books,
        message: "Books retrieved successfully".to_string(),
    }))
}

#[tracing::instrument(name = "Get Book", skip(manager))]
#[get("/{book_id}")]
pub async fn get_book(
    manager: web::Data<CirculationManager>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let book = manager.get_book(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse {
        success: true,
        data: json!({
            "id": book.id,
            "title": book.title,
            "author": book.author,
            "category": book.category,
            "total_count": book.total_count,
            "available_count": book.available_count,
            "available_copies": book.available_copies,
        }),
        message: "Book retrieved successfully".to_string(),
    }))
}
