pub mod category;
pub mod log;
pub mod notification;
pub mod pricing;
pub mod product;
pub mod role;
pub mod shipping;
pub mod user;
