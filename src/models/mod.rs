pub mod auth;
pub mod common;
pub mod draw;
pub mod pagination;
pub mod participant;
pub mod restaurant;

pub use auth::*;
pub use common::*;
pub use draw::*;
pub use pagination::*;
pub use participant::*;
pub use restaurant::*;
