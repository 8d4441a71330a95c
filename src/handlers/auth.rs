use actix_web::{web, HttpResponse, Result, ResponseError};
use crate::models::*;
use crate::services::AuthService;

#[utoipa::path(
    post,
    path = "/auth/exchange",
    tag = "auth",
    request_body = ExchangeTokenRequest,
    responses(
        (status = 200, description = "换取会话令牌成功", body = ExchangeTokenResponse),
        (status = 400, description = "缺少 provider_token"),
        (status = 401, description = "外部令牌无效"),
        (status = 502, description = "认证服务不可用")
    )
)]
/// 用外部认证服务的 token 换取本服务的 access token
pub async fn exchange(
    auth_service: web::Data<AuthService>,
    request: web::Json<ExchangeTokenRequest>,
) -> Result<HttpResponse> {
    match auth_service.exchange_token(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/exchange", web::post().to(exchange))
    );
}
