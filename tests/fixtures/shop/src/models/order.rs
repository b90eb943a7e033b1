use super::user::User;
use serde::Serialize;

#[derive(Serialize)]
pub struct Order {
    pub id: u64,
    pub customer: User,
    pub lines: Vec<OrderLine>,
    pub status: Status,
    /// Order this one was split from
    pub parent: Option<Box<Order>>,
}

#[derive(Serialize)]
pub struct OrderLine {
    pub sku: String,
    pub quantity: u32,
    pub unit_price: f64,
}

#[derive(Serialize)]
#[repr(u8)]
pub enum Status {
    Pending = 1,
    Paid = 2,
    Shipped = 3,
}
