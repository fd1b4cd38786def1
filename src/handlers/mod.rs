pub mod health;
pub mod whatsapp;

use crate::errors::AppError;

pub async fn not_found() -> AppError {
    AppError::NotFound
}
