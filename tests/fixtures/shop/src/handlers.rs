use crate::models::order::Order;
use crate::models::user::{CreateUser, User};
use crate::models::Page;
use crate::AppError;
use axum::extract::{Json, Path, Query};

/// List users.
///
/// Returns one page of users,
/// newest first.
///
/// # Arguments
///
/// * `cursor` - Cursor from a previous page
/// * `limit` (query) - Page size
pub async fn list_users(Query(cursor): Query<Option<String>>) -> Json<Page<User>> {
    unimplemented!()
}

/// Fetch a user.
pub async fn get_user(Path(id): Path<u64>) -> Option<Json<User>> {
    unimplemented!()
}

/// Create a user.
///
/// # Arguments
///
/// * `payload` - The user to create
pub async fn create_user(Json(payload): Json<CreateUser>) -> Json<User> {
    unimplemented!()
}

pub async fn delete_user(Path(id): Path<u64>) {}

pub async fn get_order(Path(id): Path<u64>) -> Result<Json<Order>, AppError> {
    unimplemented!()
}

pub async fn list_orders() -> Json<Page<Order>> {
    unimplemented!()
}

pub async fn health() {}
