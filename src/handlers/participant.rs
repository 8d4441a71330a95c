use super::draw::parse_draw_id;
use crate::middlewares::{current_user, operator_business};
use crate::models::*;
use crate::services::{AuthService, CompletionOutcome, DrawService, JoinOutcome};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

fn join_response(joined: JoinOutcome) -> JoinDrawResponse {
    let completion = match &joined.outcome {
        CompletionOutcome::Completed {
            winner,
            total_participants,
        } => Some(CompletionSummary {
            status: joined.draw.status,
            winner_user_id: Some(winner.user_id.clone()),
            total_participants: *total_participants,
            is_automatic_winner: winner.automatic,
        }),
        _ => None,
    };

    JoinDrawResponse {
        is_winner: joined.participation.is_winner,
        participation: ParticipantResponse::from(joined.participation),
        completion,
    }
}

#[utoipa::path(
    post,
    path = "/draws/{id}/participants",
    tag = "participants",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "参与成功", body = JoinDrawResponse),
        (status = 400, description = "抽奖未开放或已过开奖时间"),
        (status = 401, description = "需要用户登录"),
        (status = 404, description = "抽奖不存在"),
        (status = 409, description = "已参与过")
    )
)]
/// 参与抽奖；达到条件时同一请求内完成开奖
pub async fn join_draw(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let user_id = match current_user(&req) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service.join_draw(draw_id, &user_id).await {
        Ok(joined) => {
            let message = if joined.participation.is_winner {
                "Joined and won the draw"
            } else {
                "Joined the draw"
            };
            Ok(HttpResponse::Created()
                .json(ApiResponse::success_with_message(join_response(joined), message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{id}/participants",
    tag = "participants",
    params(
        ("id" = String, Path, description = "抽奖ID (UUID)"),
        PaginationParams
    ),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "参与记录", body = PaginatedParticipantResponse),
        (status = 404, description = "抽奖不存在")
    )
)]
pub async fn list_participants(
    service: web::Data<DrawService>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    let params = query.into_inner();

    match service
        .list_participants(draw_id, operator_business(&req), &params)
        .await
    {
        Ok(page) => {
            let page = PaginatedResponse::new(
                page.items
                    .into_iter()
                    .map(ParticipantResponse::from)
                    .collect(),
                &params,
                page.total,
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{id}/participants-with-users",
    tag = "participants",
    params(("id" = String, Path, description = "抽奖ID (UUID)")),
    security(("bearer_auth" = []), ("business_id" = [])),
    responses(
        (status = 200, description = "附带用户信息的参与记录", body = ParticipantsWithUsersResponse),
        (status = 404, description = "抽奖不存在")
    )
)]
/// 全部参与记录 + 外部用户信息；单个用户查询失败不影响整体
pub async fn list_participants_with_users(
    service: web::Data<DrawService>,
    auth: web::Data<AuthService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let draw_id = match parse_draw_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };

    match service
        .all_participants(draw_id, operator_business(&req))
        .await
    {
        Ok(list) => {
            let participants = auth.enrich_participants(list).await;
            let total = participants.len() as u64;
            Ok(HttpResponse::Ok().json(ApiResponse::success(ParticipantsWithUsersResponse {
                participants,
                total,
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

/// 挂在 /draws 作用域下
pub fn participant_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/{id}/participants", web::post().to(join_draw))
        .route("/{id}/participants", web::get().to(list_participants))
        .route(
            "/{id}/participants-with-users",
            web::get().to(list_participants_with_users),
        );
}
