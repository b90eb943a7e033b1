pub mod handlers;
pub mod models;

#[derive(Debug)]
pub struct AppError {
    pub message: String,
}
