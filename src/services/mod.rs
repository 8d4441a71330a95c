pub mod auth_service;
pub mod draw_service;
pub mod lifecycle;

pub use auth_service::*;
pub use draw_service::*;
