use actix_cors::Cors;

use super::BUSINESS_ID_HEADER;

/// 前端与演示后台都跨域访问，允许任意来源
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            actix_web::http::header::AUTHORIZATION,
            actix_web::http::header::CONTENT_TYPE,
            actix_web::http::header::ACCEPT,
        ])
        .allowed_header(BUSINESS_ID_HEADER)
        .max_age(3600)
}
