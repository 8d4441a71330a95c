pub mod auth;
pub mod draw;
pub mod participant;
pub mod restaurant;
pub mod system;


pub use auth::auth_config;
pub use draw::draw_config;
pub use restaurant::restaurant_config;
pub use system::system_config;

use actix_web::web;

/// /api/v1 下的全部路由
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(system_config)
            .configure(auth_config)
            .configure(restaurant_config)
            .configure(draw_config),
    );
}
