use crate::config::DemoBusinessConfig;
use crate::error::AppError;
use crate::middlewares::operator_business;
use crate::models::*;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/restaurant/me",
    tag = "restaurant",
    security(("business_id" = [])),
    responses(
        (status = 200, description = "当前商家信息", body = RestaurantResponse),
        (status = 401, description = "需要 X-Business-ID")
    )
)]
/// 当前（演示）商家信息
pub async fn me(demo: web::Data<DemoBusinessConfig>, req: HttpRequest) -> Result<HttpResponse> {
    if operator_business(&req).is_none() {
        return Ok(AppError::AuthError("Business authentication required".to_string())
            .error_response());
    }
    Ok(HttpResponse::Ok().json(ApiResponse::success(RestaurantResponse::from(
        demo.get_ref(),
    ))))
}

pub fn restaurant_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/restaurant").route("/me", web::get().to(me)));
}
