use crate::error::{AppError, AppResult};
use crate::middlewares::operator_business;
use crate::models::*;
use crate::services::{AuthService, CompletionOutcome, DrawResult, DrawService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use uuid::Uuid;

/// 路径中的抽奖 id，非 UUID 返回 400
pub(crate) fn parse_draw_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::ValidationError(format!("Invalid draw id: {raw}")))
}

async fn draw_result_response(auth: &AuthService, result: DrawResult) -> DrawResultResponse {
    let (total_participants, is_automatic_winner) = match &result.outcome {
        CompletionOutcome::Completed {
            winner,
            total_participants,
        } => (*total_participants, winner.automatic),
        _ => (0, false),
    };
    let (winner, _) = auth
        .lookup_user_pair(result.draw.winner_user_id.as_deref())
        .await;

    DrawResultResponse {
        draw_id: result.draw.id,
        status: result.draw.status,
        winner_user_id: result.draw.winner_user_id,
        winner,
        total_participants,
        is_automatic_winner,
    }
}

#[utoipa::path(
    get,
    path = "/draws",
    tag = "draws",
    params(DrawListQuery),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "抽奖列表", body = PaginatedDrawResponse),
        (status = 400, description = "缺少 business_id"),
        (status = 401, description = "未授权")
    )
)]
/// 分页获取商家的抽奖（携带 X-Business-ID 时以其为准）
pub async fn list_draws(
    service: web::Data<DrawService>,
    req: HttpRequest,
    query: web::Query<DrawListQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let Some(business_id) = operator_business(&req).or(query.business_id) else {
        return Ok(
            AppError::ValidationError("business_id is required".to_string()).error_response(),
        );
    };
    let params = PaginationParams::new(query.page, query.per_page);

    match service.list_draws(business_id, query.status, &params).await {
        Ok(page) => {
            let page = PaginatedResponse::new(
                page.items.into_iter().map(DrawResponse::from).collect(),
                &params,
                page.total,
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws",
    tag = "draws",
    request_body = CreateDrawRequest,
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 201, description = "创建成功", body = DrawResponse),
        (status = 400, description = "参数错误"),
        (status = 401, description = "未授权")
    )
)]
/// 创建抽奖
pub async fn create_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    body: web::Json<CreateDrawRequest>,
) -> Result<HttpResponse> {
    let body = body.into_inner();
    let Some(business_id) = operator_business(&req).or(body.business_id) else {
        return Ok(
            AppError::ValidationError("business_id is required".to_string()).error_response(),
        );
    };

    match service.create_draw(business_id, body).await {
        Ok(draw) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            DrawResponse::from(draw),
            "Draw created",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{id}",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "抽奖详情", body = DrawDetailResponse),
        (status = 400, description = "id 格式错误"),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 抽奖详情；读取时会检查是否已满足开奖条件
pub async fn get_draw(
    service: web::Data<DrawService>,
    auth: web::Data<AuthService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.get_draw(draw_id).await {
        Ok(view) => {
            let (winner, winner_error) = auth
                .lookup_user_pair(view.draw.winner_user_id.as_deref())
                .await;
            let detail = DrawDetailResponse {
                draw: DrawResponse::from(view.draw),
                participant_count: view.participant_count,
                winner,
                winner_error,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(detail)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/draws/{id}",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    request_body = UpdateDrawRequest,
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "修改成功", body = DrawResponse),
        (status = 400, description = "参数或状态错误"),
        (status = 403, description = "已有参与者，不可修改"),
        (status = 404, description = "抽奖不存在")
    )
)]
pub async fn update_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateDrawRequest>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service
        .update_draw(draw_id, operator_business(&req), body.into_inner())
        .await
    {
        Ok(draw) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            DrawResponse::from(draw),
            "Draw updated",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/draws/{id}",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 204, description = "已删除"),
        (status = 403, description = "已有参与者，不可删除"),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 软删除
pub async fn delete_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.delete_draw(draw_id, operator_business(&req)).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws/{id}/close",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "已结束参与", body = CloseDrawResponse),
        (status = 400, description = "当前状态不可关闭"),
        (status = 404, description = "抽奖不存在")
    )
)]
pub async fn close_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.close_draw(draw_id, operator_business(&req)).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            CloseDrawResponse {
                draw_id: view.draw.id,
                status: view.draw.status,
                participant_count: view.participant_count,
            },
            "Draw closed",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws/{id}/complete",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "开奖结果", body = DrawResultResponse),
        (status = 400, description = "状态不允许或无参与者"),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 对 closed 抽奖开奖
pub async fn complete_draw(
    service: web::Data<DrawService>,
    auth: web::Data<AuthService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.complete_draw(draw_id, operator_business(&req)).await {
        Ok(result) => {
            let data = draw_result_response(&auth, result).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(data, "Draw completed")))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws/{id}/publish",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "开奖结果（可能无中奖者）", body = DrawResultResponse),
        (status = 400, description = "状态不允许或未到开奖时间"),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 公布结果（active 或 closed 均可）
pub async fn publish_draw(
    service: web::Data<DrawService>,
    auth: web::Data<AuthService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.publish_draw(draw_id, operator_business(&req)).await {
        Ok(result) => {
            let data = draw_result_response(&auth, result).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(data, "Result published")))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/draws/{id}/cancel",
    tag = "draws",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "已取消", body = DrawResponse),
        (status = 400, description = "当前状态不可取消"),
        (status = 403, description = "已有参与者，不可取消"),
        (status = 404, description = "抽奖不存在")
    )
)]
pub async fn cancel_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.cancel_draw(draw_id, operator_business(&req)).await {
        Ok(draw) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            DrawResponse::from(draw),
            "Draw cancelled",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .route("", web::get().to(list_draws))
            .route("", web::post().to(create_draw))
            .route("/{id}", web::get().to(get_draw))
            .route("/{id}", web::put().to(update_draw))
            .route("/{id}", web::delete().to(delete_draw))
            .route("/{id}/close", web::post().to(close_draw))
            .route("/{id}/complete", web::post().to(complete_draw))
            .route("/{id}/publish", web::post().to(publish_draw))
            .route("/{id}/cancel", web::post().to(cancel_draw))
            .configure(super::participant::participant_config),
    );
}
