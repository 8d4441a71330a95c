use crate::entities::{
    DrawStatus, DrawType, draw_entity as draws, draw_participant_entity as participants,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateDrawRequest, PaginatedResponse, PaginationParams, UpdateDrawRequest};
use crate::services::lifecycle::{self, DrawAction, WinnerPick};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Query, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait, UpdateMany,
};
use uuid::Uuid;

/// 抽奖及其参与人数
#[derive(Debug, Clone)]
pub struct DrawView {
    pub draw: draws::Model,
    pub participant_count: u64,
}

/// 一次开奖尝试的结果
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// 未满足开奖条件，抽奖未变化
    NotDue,
    /// 已选出中奖者
    Completed {
        winner: WinnerPick,
        total_participants: u64,
    },
    /// 无参与者，直接置为 completed（publish）
    CompletedWithoutWinner,
    /// 无参与者，active 抽奖被关闭（自动开奖）
    ClosedWithoutWinner,
    /// 条件更新未命中：其他请求已先修改了状态
    AlreadyCompleted,
}

impl CompletionOutcome {
    pub fn winner(&self) -> Option<&WinnerPick> {
        match self {
            CompletionOutcome::Completed { winner, .. } => Some(winner),
            _ => None,
        }
    }
}

/// 开奖后的抽奖（已重新读取）与结果
#[derive(Debug, Clone)]
pub struct DrawResult {
    pub draw: draws::Model,
    pub outcome: CompletionOutcome,
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub participation: participants::Model,
    pub draw: draws::Model,
    pub outcome: CompletionOutcome,
}

#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 分页获取商家的抽奖（最新在前，已软删除的不返回）
    pub async fn list_draws(
        &self,
        business_id: Uuid,
        status: Option<DrawStatus>,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<draws::Model>> {
        let mut base_query = draws::Entity::find()
            .filter(draws::Column::BusinessId.eq(business_id))
            .filter(draws::Column::IsActive.eq(true));
        if let Some(status) = status {
            base_query = base_query.filter(draws::Column::Status.eq(status));
        }

        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(draws::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(items, params, total))
    }

    pub async fn create_draw(
        &self,
        business_id: Uuid,
        req: CreateDrawRequest,
    ) -> AppResult<draws::Model> {
        let title = validate_fields(
            &req.title,
            req.draw_type,
            req.draw_date,
            req.trigger_value,
            req.winning_probability,
        )?;

        let status = req.status.unwrap_or(DrawStatus::Active);
        if !matches!(status, DrawStatus::Draft | DrawStatus::Active) {
            return Err(AppError::ValidationError(
                "A new draw must start as draft or active".into(),
            ));
        }

        let now = Utc::now();
        let draw = draws::ActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            title: Set(title),
            description: Set(req.description),
            draw_type: Set(req.draw_type),
            draw_date: Set(req.draw_date),
            trigger_value: Set(req.trigger_value),
            winning_probability: Set(req.winning_probability.unwrap_or(0.0)),
            status: Set(status),
            winner_user_id: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Draw created: id={} business={} type={} status={}",
            draw.id,
            draw.business_id,
            draw.draw_type,
            draw.status
        );
        Ok(draw)
    }

    /// 获取详情；读取前做一次惰性开奖检查
    pub async fn get_draw(&self, draw_id: Uuid) -> AppResult<DrawView> {
        let checked = self.check_and_complete(draw_id).await?;
        let participant_count = count_participants(&self.pool, draw_id).await?;
        Ok(DrawView {
            draw: checked.draw,
            participant_count,
        })
    }

    /// 惰性开奖检查
    ///
    /// 已 completed 直接返回；满足条件时在事务中开奖。只在读取详情与参与时调用，
    /// 没有后台任务推动状态变化。
    pub async fn check_and_complete(&self, draw_id: Uuid) -> AppResult<DrawResult> {
        let draw = find_active(&self.pool, draw_id, None).await?;
        if draw.status == DrawStatus::Completed
            || lifecycle::transition(draw.status, DrawAction::AutoComplete).is_err()
        {
            return Ok(DrawResult {
                draw,
                outcome: CompletionOutcome::NotDue,
            });
        }

        let count = count_participants(&self.pool, draw_id).await?;
        if !lifecycle::is_due(&draw, count, Utc::now()) {
            return Ok(DrawResult {
                draw,
                outcome: CompletionOutcome::NotDue,
            });
        }

        let txn = self.pool.begin().await?;
        let outcome = complete_with_winner(&txn, &draw, DrawAction::AutoComplete).await?;
        let draw = find_active(&txn, draw_id, None).await?;
        txn.commit().await?;

        Ok(DrawResult { draw, outcome })
    }

    /// 修改抽奖（无参与者时才允许）
    pub async fn update_draw(
        &self,
        draw_id: Uuid,
        scope: Option<Uuid>,
        req: UpdateDrawRequest,
    ) -> AppResult<draws::Model> {
        let draw = find_active(&self.pool, draw_id, scope).await?;
        let count = count_participants(&self.pool, draw_id).await?;
        lifecycle::ensure_unlocked(count, DrawAction::Update)?;

        let title = validate_fields(
            &req.title,
            req.draw_type,
            req.draw_date,
            req.trigger_value,
            req.winning_probability,
        )?;

        let status = match req.status {
            Some(requested) if requested != draw.status => {
                let next = lifecycle::transition(draw.status, DrawAction::Activate)?;
                if next != requested {
                    return Err(AppError::InvalidTransition {
                        from: draw.status,
                        action: DrawAction::Update,
                    });
                }
                next
            }
            _ => draw.status,
        };

        let changes = draws::ActiveModel {
            title: Set(title),
            description: Set(req.description),
            draw_type: Set(req.draw_type),
            draw_date: Set(req.draw_date),
            trigger_value: Set(req.trigger_value),
            winning_probability: Set(req
                .winning_probability
                .unwrap_or(draw.winning_probability)),
            status: Set(status),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        write_update(&self.pool, &draw, changes).await?;
        find_active(&self.pool, draw_id, None).await
    }

    /// 软删除（无参与者时才允许）
    pub async fn delete_draw(&self, draw_id: Uuid, scope: Option<Uuid>) -> AppResult<()> {
        find_active(&self.pool, draw_id, scope).await?;
        let count = count_participants(&self.pool, draw_id).await?;
        lifecycle::ensure_unlocked(count, DrawAction::Delete)?;

        write_soft_delete(&self.pool, draw_id).await?;

        log::info!("Draw soft-deleted: id={draw_id}");
        Ok(())
    }

    /// 参与抽奖
    ///
    /// 整个流程在一个事务内完成：先对 draw 行做条件更新（Postgres 下即行锁），
    /// 同一抽奖的并发参与因此串行化，满员触发的开奖最多发生一次。
    pub async fn join_draw(&self, draw_id: Uuid, user_id: &str) -> AppResult<JoinOutcome> {
        // 到期的定时抽奖先开奖，随后的 active 检查会拒绝参与
        self.check_and_complete(draw_id).await?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;

        let draw = find_active(&txn, draw_id, None).await?;
        lifecycle::ensure_joinable(&draw, now)?;

        let locked = draws::Entity::update_many()
            .col_expr(draws::Column::UpdatedAt, Expr::value(now))
            .filter(draws::Column::Id.eq(draw_id))
            .filter(draws::Column::IsActive.eq(true))
            .filter(draws::Column::Status.eq(DrawStatus::Active))
            .exec(&txn)
            .await?;
        if locked.rows_affected == 0 {
            return Err(AppError::ValidationError("Draw is not active".into()));
        }

        if let Some(existing) = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .filter(participants::Column::UserId.eq(user_id))
            .one(&txn)
            .await?
        {
            return Err(already_participated(Some(existing.participated_at)));
        }

        let participation = participants::ActiveModel {
            id: Set(Uuid::new_v4()),
            draw_id: Set(draw_id),
            user_id: Set(user_id.to_string()),
            participated_at: Set(now),
            is_winner: Set(false),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => already_participated(None),
            _ => AppError::DatabaseError(e),
        })?;

        let count = count_participants(&txn, draw_id).await?;
        let outcome = if lifecycle::is_due(&draw, count, now) {
            complete_with_winner(&txn, &draw, DrawAction::AutoComplete).await?
        } else {
            CompletionOutcome::NotDue
        };

        let participation = participants::Entity::find_by_id(participation.id)
            .one(&txn)
            .await?
            .unwrap_or(participation);
        let draw = find_active(&txn, draw_id, None).await?;
        txn.commit().await?;

        log::info!(
            "User {user_id} joined draw {draw_id} ({count} participant(s), outcome={outcome:?})"
        );
        Ok(JoinOutcome {
            participation,
            draw,
            outcome,
        })
    }

    /// 分页获取参与记录（最新在前）
    pub async fn list_participants(
        &self,
        draw_id: Uuid,
        scope: Option<Uuid>,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<participants::Model>> {
        find_active(&self.pool, draw_id, scope).await?;

        let base_query =
            participants::Entity::find().filter(participants::Column::DrawId.eq(draw_id));
        let total = base_query.clone().count(&self.pool).await?;
        let items = base_query
            .order_by_desc(participants::Column::ParticipatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(items, params, total))
    }

    /// 全部参与记录（最新在前）
    pub async fn all_participants(
        &self,
        draw_id: Uuid,
        scope: Option<Uuid>,
    ) -> AppResult<Vec<participants::Model>> {
        find_active(&self.pool, draw_id, scope).await?;
        let list = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .order_by_desc(participants::Column::ParticipatedAt)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 结束参与期: active -> closed
    pub async fn close_draw(&self, draw_id: Uuid, scope: Option<Uuid>) -> AppResult<DrawView> {
        let draw = find_active(&self.pool, draw_id, scope).await?;
        let next = lifecycle::transition(draw.status, DrawAction::Close)?;

        if !update_status(&self.pool, &draw, next, None).await? {
            return Err(race_lost(&self.pool, draw_id, DrawAction::Close).await);
        }

        let participant_count = count_participants(&self.pool, draw_id).await?;
        log::info!("Draw closed: id={draw_id} participants={participant_count}");
        Ok(DrawView {
            draw: find_active(&self.pool, draw_id, None).await?,
            participant_count,
        })
    }

    /// 对已关闭的抽奖开奖: closed -> completed，至少需要一名参与者
    pub async fn complete_draw(&self, draw_id: Uuid, scope: Option<Uuid>) -> AppResult<DrawResult> {
        let txn = self.pool.begin().await?;
        let draw = find_active(&txn, draw_id, scope).await?;
        lifecycle::transition(draw.status, DrawAction::Complete)?;

        let outcome = complete_with_winner(&txn, &draw, DrawAction::Complete).await?;
        if outcome == CompletionOutcome::AlreadyCompleted {
            return Err(race_lost(&txn, draw_id, DrawAction::Complete).await);
        }

        let draw = find_active(&txn, draw_id, None).await?;
        txn.commit().await?;
        Ok(DrawResult { draw, outcome })
    }

    /// 公布结果: active/closed -> completed；定时抽奖需到达开奖时间，
    /// 无参与者时直接完成且无中奖者
    pub async fn publish_draw(&self, draw_id: Uuid, scope: Option<Uuid>) -> AppResult<DrawResult> {
        let txn = self.pool.begin().await?;
        let draw = find_active(&txn, draw_id, scope).await?;
        lifecycle::ensure_publishable(&draw, Utc::now())?;
        lifecycle::transition(draw.status, DrawAction::Publish)?;

        let outcome = complete_with_winner(&txn, &draw, DrawAction::Publish).await?;
        if outcome == CompletionOutcome::AlreadyCompleted {
            return Err(race_lost(&txn, draw_id, DrawAction::Publish).await);
        }

        let draw = find_active(&txn, draw_id, None).await?;
        txn.commit().await?;
        Ok(DrawResult { draw, outcome })
    }

    /// 取消: draft/active -> closed（无参与者时才允许）
    pub async fn cancel_draw(&self, draw_id: Uuid, scope: Option<Uuid>) -> AppResult<draws::Model> {
        let draw = find_active(&self.pool, draw_id, scope).await?;
        let count = count_participants(&self.pool, draw_id).await?;
        lifecycle::ensure_unlocked(count, DrawAction::Cancel)?;
        let next = lifecycle::transition(draw.status, DrawAction::Cancel)?;

        write_cancel(&self.pool, &draw, next).await?;

        log::info!("Draw cancelled: id={draw_id}");
        find_active(&self.pool, draw_id, None).await
    }
}

// -----------------------------
// 内部辅助方法
// -----------------------------

fn not_found(draw_id: Uuid) -> AppError {
    AppError::NotFound(format!("Draw {draw_id} not found"))
}

fn already_participated(participated_at: Option<DateTime<Utc>>) -> AppError {
    AppError::Conflict {
        message: "User already participated".into(),
        participated_at,
    }
}

/// 校验可编辑字段，返回去除首尾空白后的标题
fn validate_fields(
    title: &str,
    draw_type: DrawType,
    draw_date: Option<DateTime<Utc>>,
    trigger_value: Option<i32>,
    winning_probability: Option<f64>,
) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::ValidationError("Title is required".into()));
    }
    if title.chars().count() > 255 {
        return Err(AppError::ValidationError(
            "Title must be at most 255 characters".into(),
        ));
    }
    if draw_type == DrawType::FixedDate && draw_date.is_none() {
        return Err(AppError::ValidationError(
            "draw_date is required for fixed_date type".into(),
        ));
    }
    if let Some(target) = trigger_value
        && target < 1
    {
        return Err(AppError::ValidationError(
            "trigger_value must be at least 1".into(),
        ));
    }
    if let Some(p) = winning_probability
        && !(p.is_finite() && (0.0..=100.0).contains(&p))
    {
        return Err(AppError::ValidationError(
            "winning_probability must be between 0 and 100".into(),
        ));
    }
    Ok(title.to_string())
}

/// 读取未删除的抽奖；scope 为 Some 时必须属于该商家
async fn find_active<C: ConnectionTrait>(
    conn: &C,
    draw_id: Uuid,
    scope: Option<Uuid>,
) -> AppResult<draws::Model> {
    let draw = draws::Entity::find_by_id(draw_id)
        .filter(draws::Column::IsActive.eq(true))
        .one(conn)
        .await?
        .ok_or_else(|| not_found(draw_id))?;

    match scope {
        Some(business_id) if business_id != draw.business_id => Err(not_found(draw_id)),
        _ => Ok(draw),
    }
}

async fn count_participants<C: ConnectionTrait>(conn: &C, draw_id: Uuid) -> AppResult<u64> {
    let count = participants::Entity::find()
        .filter(participants::Column::DrawId.eq(draw_id))
        .count(conn)
        .await?;
    Ok(count)
}

/// NOT EXISTS (SELECT 1 FROM draw_participants WHERE draw_id = ?)
fn no_participants(draw_id: Uuid) -> SimpleExpr {
    Expr::exists(
        Query::select()
            .expr(Expr::val(1))
            .from(participants::Entity)
            .and_where(participants::Column::DrawId.eq(draw_id))
            .to_owned(),
    )
    .not()
}

/// 仅在抽奖未删除且没有任何参与者时生效的写入；未命中时给出拒绝原因
async fn guarded_write<C: ConnectionTrait>(
    conn: &C,
    draw_id: Uuid,
    action: DrawAction,
    query: UpdateMany<draws::Entity>,
) -> AppResult<()> {
    let result = query
        .filter(draws::Column::Id.eq(draw_id))
        .filter(draws::Column::IsActive.eq(true))
        .filter(no_participants(draw_id))
        .exec(conn)
        .await?;
    if result.rows_affected == 0 {
        return Err(diagnose_rejected_write(conn, draw_id, action).await);
    }
    Ok(())
}

async fn write_update<C: ConnectionTrait>(
    conn: &C,
    draw: &draws::Model,
    changes: draws::ActiveModel,
) -> AppResult<()> {
    let query = draws::Entity::update_many()
        .set(changes)
        .filter(draws::Column::Status.eq(draw.status));
    guarded_write(conn, draw.id, DrawAction::Update, query).await
}

async fn write_soft_delete<C: ConnectionTrait>(conn: &C, draw_id: Uuid) -> AppResult<()> {
    let query = draws::Entity::update_many()
        .col_expr(draws::Column::IsActive, Expr::value(false))
        .col_expr(draws::Column::UpdatedAt, Expr::value(Utc::now()));
    guarded_write(conn, draw_id, DrawAction::Delete, query).await
}

async fn write_cancel<C: ConnectionTrait>(
    conn: &C,
    draw: &draws::Model,
    next: DrawStatus,
) -> AppResult<()> {
    let query = draws::Entity::update_many()
        .col_expr(draws::Column::Status, Expr::value(next))
        .col_expr(draws::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(draws::Column::Status.eq(draw.status));
    guarded_write(conn, draw.id, DrawAction::Cancel, query).await
}

/// 以 draw.status 为前置条件的原子状态更新，返回是否命中
async fn update_status<C: ConnectionTrait>(
    conn: &C,
    draw: &draws::Model,
    next: DrawStatus,
    winner_user_id: Option<String>,
) -> Result<bool, DbErr> {
    let result = draws::Entity::update_many()
        .set(draws::ActiveModel {
            status: Set(next),
            winner_user_id: Set(winner_user_id),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(draws::Column::Id.eq(draw.id))
        .filter(draws::Column::IsActive.eq(true))
        .filter(draws::Column::Status.eq(draw.status))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// 开奖核心：读取参与者 -> 选出中奖者 -> 条件更新抽奖 -> 标记中奖记录
///
/// action 决定无参与者时的处理：
/// - Complete: 报错
/// - Publish: completed 且无中奖者
/// - AutoComplete: active 关闭为 closed，closed 保持不变
async fn complete_with_winner(
    txn: &DatabaseTransaction,
    draw: &draws::Model,
    action: DrawAction,
) -> AppResult<CompletionOutcome> {
    let next = lifecycle::transition(draw.status, action)?;

    let user_ids: Vec<String> = participants::Entity::find()
        .select_only()
        .column(participants::Column::UserId)
        .filter(participants::Column::DrawId.eq(draw.id))
        .order_by_asc(participants::Column::ParticipatedAt)
        .into_tuple()
        .all(txn)
        .await?;
    let total_participants = user_ids.len() as u64;

    let pick = {
        let mut rng = rand::rng();
        lifecycle::pick_winner(&user_ids, &mut rng)
    };

    let Some(winner) = pick else {
        return match action {
            DrawAction::Complete => Err(AppError::ValidationError(
                "No participants in this draw".into(),
            )),
            DrawAction::AutoComplete if draw.status == DrawStatus::Active => {
                let closed = lifecycle::transition(draw.status, DrawAction::Close)?;
                if !update_status(txn, draw, closed, None).await? {
                    return Ok(CompletionOutcome::AlreadyCompleted);
                }
                log::info!("Draw {} closed without participants", draw.id);
                Ok(CompletionOutcome::ClosedWithoutWinner)
            }
            DrawAction::AutoComplete => Ok(CompletionOutcome::NotDue),
            _ => {
                if !update_status(txn, draw, next, None).await? {
                    return Ok(CompletionOutcome::AlreadyCompleted);
                }
                log::info!("Draw {} completed without participants", draw.id);
                Ok(CompletionOutcome::CompletedWithoutWinner)
            }
        };
    };

    if !update_status(txn, draw, next, Some(winner.user_id.clone())).await? {
        return Ok(CompletionOutcome::AlreadyCompleted);
    }

    participants::Entity::update_many()
        .col_expr(participants::Column::IsWinner, Expr::value(true))
        .filter(participants::Column::DrawId.eq(draw.id))
        .filter(participants::Column::UserId.eq(winner.user_id.as_str()))
        .exec(txn)
        .await?;

    log::info!(
        "Draw {} completed via {action}: winner={} automatic={} participants={total_participants}",
        draw.id,
        winner.user_id,
        winner.automatic
    );
    Ok(CompletionOutcome::Completed {
        winner,
        total_participants,
    })
}

/// 条件更新未命中时，按当前状态给出准确的拒绝原因
async fn race_lost<C: ConnectionTrait>(conn: &C, draw_id: Uuid, action: DrawAction) -> AppError {
    match find_active(conn, draw_id, None).await {
        Ok(current) => AppError::InvalidTransition {
            from: current.status,
            action,
        },
        Err(e) => e,
    }
}

/// 受 NOT EXISTS 保护的写入未命中：可能是期间有人参与、状态变化或被删除
async fn diagnose_rejected_write<C: ConnectionTrait>(
    conn: &C,
    draw_id: Uuid,
    action: DrawAction,
) -> AppError {
    match count_participants(conn, draw_id).await {
        Ok(participants) if participants > 0 => AppError::DrawLocked {
            action,
            participants,
        },
        Ok(_) => race_lost(conn, draw_id, action).await,
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use chrono::Duration;
    use sea_orm::IntoActiveModel;

    async fn service() -> DrawService {
        DrawService::new(test_pool().await)
    }

    fn condition_request(trigger: i32) -> CreateDrawRequest {
        CreateDrawRequest {
            title: "Free dessert".into(),
            description: Some("One lucky guest".into()),
            draw_type: DrawType::Condition,
            draw_date: None,
            trigger_value: Some(trigger),
            winning_probability: Some(5.0),
            business_id: None,
            status: None,
        }
    }

    fn fixed_date_request(date: DateTime<Utc>) -> CreateDrawRequest {
        CreateDrawRequest {
            title: "Weekend dinner".into(),
            description: None,
            draw_type: DrawType::FixedDate,
            draw_date: Some(date),
            trigger_value: None,
            winning_probability: None,
            business_id: None,
            status: None,
        }
    }

    fn update_request_from(draw: &draws::Model) -> UpdateDrawRequest {
        UpdateDrawRequest {
            title: "Renamed".into(),
            description: draw.description.clone(),
            draw_type: draw.draw_type,
            draw_date: draw.draw_date,
            trigger_value: draw.trigger_value,
            winning_probability: None,
            status: None,
        }
    }

    async fn set_status(svc: &DrawService, draw_id: Uuid, status: DrawStatus) {
        let draw = draws::Entity::find_by_id(draw_id)
            .one(&svc.pool)
            .await
            .unwrap()
            .unwrap();
        let mut am = draw.into_active_model();
        am.status = Set(status);
        am.update(&svc.pool).await.unwrap();
    }

    async fn winner_rows(svc: &DrawService, draw_id: Uuid) -> Vec<participants::Model> {
        participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .filter(participants::Column::IsWinner.eq(true))
            .all(&svc.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_condition_draw_completes_on_threshold() {
        let svc = service().await;
        let business = Uuid::new_v4();
        let draw = svc.create_draw(business, condition_request(3)).await.unwrap();
        assert_eq!(draw.status, DrawStatus::Active);

        let first = svc.join_draw(draw.id, "user-a").await.unwrap();
        assert_eq!(first.outcome, CompletionOutcome::NotDue);
        let second = svc.join_draw(draw.id, "user-b").await.unwrap();
        assert_eq!(second.outcome, CompletionOutcome::NotDue);
        assert_eq!(second.draw.status, DrawStatus::Active);

        let third = svc.join_draw(draw.id, "user-c").await.unwrap();
        let winner = match &third.outcome {
            CompletionOutcome::Completed {
                winner,
                total_participants,
            } => {
                assert_eq!(*total_participants, 3);
                assert!(!winner.automatic);
                winner.user_id.clone()
            }
            other => panic!("expected completion, got {other:?}"),
        };
        assert!(["user-a", "user-b", "user-c"].contains(&winner.as_str()));
        assert_eq!(third.draw.status, DrawStatus::Completed);
        assert_eq!(third.draw.winner_user_id.as_deref(), Some(winner.as_str()));
        assert_eq!(third.participation.is_winner, winner == "user-c");

        let winners = winner_rows(&svc, draw.id).await;
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].user_id, winner);

        // 已完成的抽奖不再接受参与
        assert!(matches!(
            svc.join_draw(draw.id, "user-d").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_single_participant_is_automatic_winner() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(1))
            .await
            .unwrap();

        let joined = svc.join_draw(draw.id, "solo").await.unwrap();
        assert_eq!(
            joined.outcome,
            CompletionOutcome::Completed {
                winner: WinnerPick {
                    user_id: "solo".into(),
                    automatic: true
                },
                total_participants: 1
            }
        );
        assert!(joined.participation.is_winner);
        assert_eq!(joined.draw.winner_user_id.as_deref(), Some("solo"));
    }

    #[tokio::test]
    async fn test_close_then_complete_with_one_participant() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(10))
            .await
            .unwrap();
        svc.join_draw(draw.id, "only-one").await.unwrap();

        let closed = svc.close_draw(draw.id, None).await.unwrap();
        assert_eq!(closed.draw.status, DrawStatus::Closed);
        assert_eq!(closed.participant_count, 1);

        let result = svc.complete_draw(draw.id, None).await.unwrap();
        let winner = result.outcome.winner().unwrap();
        assert_eq!(winner.user_id, "only-one");
        assert!(winner.automatic);
        assert_eq!(result.draw.status, DrawStatus::Completed);
        assert_eq!(result.draw.winner_user_id.as_deref(), Some("only-one"));
    }

    #[tokio::test]
    async fn test_rejoin_is_conflict() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();

        let first = svc.join_draw(draw.id, "repeat").await.unwrap();
        match svc.join_draw(draw.id, "repeat").await {
            Err(AppError::Conflict {
                participated_at, ..
            }) => assert_eq!(participated_at, Some(first.participation.participated_at)),
            other => panic!("expected conflict, got {other:?}"),
        }

        let page = svc
            .list_participants(draw.id, None, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_draw_with_participants_is_locked() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();
        svc.join_draw(draw.id, "someone").await.unwrap();

        let update = svc
            .update_draw(draw.id, None, update_request_from(&draw))
            .await;
        let delete = svc.delete_draw(draw.id, None).await;
        let cancel = svc.cancel_draw(draw.id, None).await;

        assert!(matches!(
            update,
            Err(AppError::DrawLocked {
                action: DrawAction::Update,
                participants: 1
            })
        ));
        assert!(matches!(
            delete,
            Err(AppError::DrawLocked {
                action: DrawAction::Delete,
                ..
            })
        ));
        assert!(matches!(
            cancel,
            Err(AppError::DrawLocked {
                action: DrawAction::Cancel,
                ..
            })
        ));

        let unchanged = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(unchanged.draw.title, "Free dessert");
        assert_eq!(unchanged.draw.status, DrawStatus::Active);
    }

    #[tokio::test]
    async fn test_disallowed_actions_do_not_mutate() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();
        svc.join_draw(draw.id, "p1").await.unwrap();

        // active 不能直接 complete
        assert!(matches!(
            svc.complete_draw(draw.id, None).await,
            Err(AppError::InvalidTransition {
                from: DrawStatus::Active,
                action: DrawAction::Complete
            })
        ));

        svc.close_draw(draw.id, None).await.unwrap();
        // closed 不能再次 close
        assert!(matches!(
            svc.close_draw(draw.id, None).await,
            Err(AppError::InvalidTransition {
                from: DrawStatus::Closed,
                ..
            })
        ));

        let published = svc.publish_draw(draw.id, None).await.unwrap();
        assert_eq!(published.draw.status, DrawStatus::Completed);
        let winner = published.draw.winner_user_id.clone();

        for result in [
            svc.publish_draw(draw.id, None).await.map(|r| r.draw),
            svc.complete_draw(draw.id, None).await.map(|r| r.draw),
            svc.close_draw(draw.id, None).await.map(|v| v.draw),
        ] {
            assert!(matches!(
                result,
                Err(AppError::InvalidTransition {
                    from: DrawStatus::Completed,
                    ..
                })
            ));
        }

        let after = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(after.draw.status, DrawStatus::Completed);
        assert_eq!(after.draw.winner_user_id, winner);
        assert_eq!(winner_rows(&svc, draw.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_complete_without_participants_is_rejected() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();
        svc.close_draw(draw.id, None).await.unwrap();

        assert!(matches!(
            svc.complete_draw(draw.id, None).await,
            Err(AppError::ValidationError(_))
        ));
        let after = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(after.draw.status, DrawStatus::Closed);
    }

    #[tokio::test]
    async fn test_publish_without_participants_completes_without_winner() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();

        let result = svc.publish_draw(draw.id, None).await.unwrap();
        assert_eq!(result.outcome, CompletionOutcome::CompletedWithoutWinner);
        assert_eq!(result.draw.status, DrawStatus::Completed);
        assert_eq!(result.draw.winner_user_id, None);
    }

    #[tokio::test]
    async fn test_publish_before_draw_date_is_rejected() {
        let svc = service().await;
        let draw = svc
            .create_draw(
                Uuid::new_v4(),
                fixed_date_request(Utc::now() + Duration::days(1)),
            )
            .await
            .unwrap();

        assert!(matches!(
            svc.publish_draw(draw.id, None).await,
            Err(AppError::ValidationError(_))
        ));
        assert_eq!(
            svc.get_draw(draw.id).await.unwrap().draw.status,
            DrawStatus::Active
        );
    }

    #[tokio::test]
    async fn test_lazy_check_completes_fixed_date_draw() {
        let svc = service().await;
        let draw = svc
            .create_draw(
                Uuid::new_v4(),
                fixed_date_request(Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();
        svc.join_draw(draw.id, "early-bird").await.unwrap();
        svc.join_draw(draw.id, "late-comer").await.unwrap();

        // 开奖时间已到之前不变
        let before = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(before.draw.status, DrawStatus::Active);
        assert_eq!(before.participant_count, 2);

        let model = draws::Entity::find_by_id(draw.id)
            .one(&svc.pool)
            .await
            .unwrap()
            .unwrap();
        let mut am = model.into_active_model();
        am.draw_date = Set(Some(Utc::now() - Duration::minutes(1)));
        am.update(&svc.pool).await.unwrap();

        let after = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(after.draw.status, DrawStatus::Completed);
        let winner = after.draw.winner_user_id.clone().unwrap();
        assert!(winner == "early-bird" || winner == "late-comer");

        // 再次读取是幂等的
        let again = svc.check_and_complete(draw.id).await.unwrap();
        assert_eq!(again.outcome, CompletionOutcome::NotDue);
        assert_eq!(again.draw.winner_user_id.as_deref(), Some(winner.as_str()));
    }

    #[tokio::test]
    async fn test_lazy_check_closes_empty_past_draw() {
        let svc = service().await;
        let draw = svc
            .create_draw(
                Uuid::new_v4(),
                fixed_date_request(Utc::now() - Duration::minutes(1)),
            )
            .await
            .unwrap();

        let checked = svc.check_and_complete(draw.id).await.unwrap();
        assert_eq!(checked.outcome, CompletionOutcome::ClosedWithoutWinner);
        assert_eq!(checked.draw.status, DrawStatus::Closed);

        let again = svc.check_and_complete(draw.id).await.unwrap();
        assert_eq!(again.outcome, CompletionOutcome::NotDue);
        assert_eq!(again.draw.status, DrawStatus::Closed);
    }

    #[tokio::test]
    async fn test_draft_is_not_auto_completed_or_joinable() {
        let svc = service().await;
        let mut req = fixed_date_request(Utc::now() - Duration::minutes(1));
        req.status = Some(DrawStatus::Draft);
        let draw = svc.create_draw(Uuid::new_v4(), req).await.unwrap();

        let view = svc.get_draw(draw.id).await.unwrap();
        assert_eq!(view.draw.status, DrawStatus::Draft);
        assert!(matches!(
            svc.join_draw(draw.id, "u").await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_or_deleted_draw_is_not_found() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();
        svc.delete_draw(draw.id, None).await.unwrap();

        for id in [Uuid::new_v4(), draw.id] {
            let params = PaginationParams::default();
            let results: Vec<AppResult<()>> = vec![
                svc.get_draw(id).await.map(|_| ()),
                svc.update_draw(id, None, update_request_from(&draw))
                    .await
                    .map(|_| ()),
                svc.delete_draw(id, None).await,
                svc.join_draw(id, "u").await.map(|_| ()),
                svc.list_participants(id, None, &params).await.map(|_| ()),
                svc.all_participants(id, None).await.map(|_| ()),
                svc.close_draw(id, None).await.map(|_| ()),
                svc.complete_draw(id, None).await.map(|_| ()),
                svc.publish_draw(id, None).await.map(|_| ()),
                svc.cancel_draw(id, None).await.map(|_| ()),
            ];
            for result in results {
                assert!(
                    matches!(result, Err(AppError::NotFound(_))),
                    "expected not found for {id}, got {result:?}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_business_scope_hides_foreign_draws() {
        let svc = service().await;
        let owner = Uuid::new_v4();
        let draw = svc.create_draw(owner, condition_request(5)).await.unwrap();

        assert!(matches!(
            svc.close_draw(draw.id, Some(Uuid::new_v4())).await,
            Err(AppError::NotFound(_))
        ));
        assert!(svc.close_draw(draw.id, Some(owner)).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_transitions() {
        let svc = service().await;
        let mut req = condition_request(5);
        req.status = Some(DrawStatus::Draft);
        let draw = svc.create_draw(Uuid::new_v4(), req).await.unwrap();

        let cancelled = svc.cancel_draw(draw.id, None).await.unwrap();
        assert_eq!(cancelled.status, DrawStatus::Closed);

        assert!(matches!(
            svc.cancel_draw(draw.id, None).await,
            Err(AppError::InvalidTransition {
                from: DrawStatus::Closed,
                action: DrawAction::Cancel
            })
        ));
    }

    #[tokio::test]
    async fn test_update_draw() {
        let svc = service().await;
        let mut req = condition_request(5);
        req.status = Some(DrawStatus::Draft);
        let draw = svc.create_draw(Uuid::new_v4(), req).await.unwrap();

        let mut update = update_request_from(&draw);
        update.status = Some(DrawStatus::Active);
        update.trigger_value = Some(8);
        let updated = svc.update_draw(draw.id, None, update).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.status, DrawStatus::Active);
        assert_eq!(updated.trigger_value, Some(8));
        assert_eq!(updated.winning_probability, 5.0);

        // active -> draft 不允许
        let mut back = update_request_from(&updated);
        back.status = Some(DrawStatus::Draft);
        assert!(matches!(
            svc.update_draw(draw.id, None, back).await,
            Err(AppError::InvalidTransition { .. })
        ));

        // 不能借 update 直接开奖
        set_status(&svc, draw.id, DrawStatus::Closed).await;
        let mut complete = update_request_from(&updated);
        complete.status = Some(DrawStatus::Completed);
        assert!(svc.update_draw(draw.id, None, complete).await.is_err());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let svc = service().await;
        let business = Uuid::new_v4();

        let mut blank = condition_request(3);
        blank.title = "   ".into();
        let mut no_date = fixed_date_request(Utc::now());
        no_date.draw_date = None;
        let zero_trigger = condition_request(0);
        let mut bad_probability = condition_request(3);
        bad_probability.winning_probability = Some(f64::NAN);
        let mut completed = condition_request(3);
        completed.status = Some(DrawStatus::Completed);

        for req in [blank, no_date, zero_trigger, bad_probability, completed] {
            assert!(matches!(
                svc.create_draw(business, req).await,
                Err(AppError::ValidationError(_))
            ));
        }

        let page = svc
            .list_draws(business, None, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_list_draws_filters() {
        let svc = service().await;
        let business = Uuid::new_v4();
        let other = Uuid::new_v4();

        let a = svc.create_draw(business, condition_request(3)).await.unwrap();
        let mut draft = condition_request(3);
        draft.status = Some(DrawStatus::Draft);
        svc.create_draw(business, draft).await.unwrap();
        let deleted = svc.create_draw(business, condition_request(3)).await.unwrap();
        svc.delete_draw(deleted.id, None).await.unwrap();
        svc.create_draw(other, condition_request(3)).await.unwrap();

        let all = svc
            .list_draws(business, None, &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert!(all.items.iter().all(|d| d.business_id == business));

        let active = svc
            .list_draws(
                business,
                Some(DrawStatus::Active),
                &PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(active.total, 1);
        assert_eq!(active.items[0].id, a.id);

        let paged = svc
            .list_draws(business, None, &PaginationParams::new(Some(2), Some(1)))
            .await
            .unwrap();
        assert_eq!(paged.items.len(), 1);
        assert_eq!(paged.total_pages, 2);
    }

    async fn insert_participant(svc: &DrawService, draw_id: Uuid, user_id: &str) {
        participants::ActiveModel {
            id: Set(Uuid::new_v4()),
            draw_id: Set(draw_id),
            user_id: Set(user_id.to_string()),
            participated_at: Set(Utc::now()),
            is_winner: Set(false),
        }
        .insert(&svc.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_participants_scoped_by_operator_business() {
        let svc = service().await;
        let owner = Uuid::new_v4();
        let draw = svc.create_draw(owner, condition_request(5)).await.unwrap();
        svc.join_draw(draw.id, "guest").await.unwrap();
        let params = PaginationParams::default();

        assert!(matches!(
            svc.list_participants(draw.id, Some(Uuid::new_v4()), &params)
                .await,
            Err(AppError::NotFound(_))
        ));
        let page = svc
            .list_participants(draw.id, Some(owner), &params)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].user_id, "guest");
    }

    #[tokio::test]
    async fn test_stale_completion_keeps_existing_winner() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(10))
            .await
            .unwrap();
        svc.join_draw(draw.id, "a").await.unwrap();
        svc.join_draw(draw.id, "b").await.unwrap();

        // 另一个请求读到 active 后，本请求先完成开奖
        let stale = find_active(&svc.pool, draw.id, None).await.unwrap();
        assert_eq!(stale.status, DrawStatus::Active);
        let published = svc.publish_draw(draw.id, None).await.unwrap();
        let winner = published.draw.winner_user_id.clone().unwrap();

        let txn = svc.pool.begin().await.unwrap();
        let outcome = complete_with_winner(&txn, &stale, DrawAction::AutoComplete)
            .await
            .unwrap();
        let explicit = race_lost(&txn, draw.id, DrawAction::Complete).await;
        txn.commit().await.unwrap();

        assert_eq!(outcome, CompletionOutcome::AlreadyCompleted);
        assert!(matches!(
            explicit,
            AppError::InvalidTransition {
                from: DrawStatus::Completed,
                action: DrawAction::Complete
            }
        ));

        let after = find_active(&svc.pool, draw.id, None).await.unwrap();
        assert_eq!(after.status, DrawStatus::Completed);
        assert_eq!(after.winner_user_id.as_deref(), Some(winner.as_str()));
        let winners = winner_rows(&svc, draw.id).await;
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].user_id, winner);
    }

    #[tokio::test]
    async fn test_guarded_writes_reject_late_participant() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();

        // 前置人数检查之后才出现的参与记录
        insert_participant(&svc, draw.id, "late").await;

        let changes = draws::ActiveModel {
            title: Set("Renamed".into()),
            ..Default::default()
        };
        let update = write_update(&svc.pool, &draw, changes).await;
        let delete = write_soft_delete(&svc.pool, draw.id).await;
        let cancel = write_cancel(&svc.pool, &draw, DrawStatus::Closed).await;

        for (result, expected) in [
            (update, DrawAction::Update),
            (delete, DrawAction::Delete),
            (cancel, DrawAction::Cancel),
        ] {
            match result {
                Err(AppError::DrawLocked {
                    action,
                    participants,
                }) => {
                    assert_eq!(action, expected);
                    assert_eq!(participants, 1);
                }
                other => panic!("{expected}: expected locked, got {other:?}"),
            }
        }

        let after = find_active(&svc.pool, draw.id, None).await.unwrap();
        assert_eq!(after.title, "Free dessert");
        assert_eq!(after.status, DrawStatus::Active);
    }

    #[tokio::test]
    async fn test_guarded_write_after_status_change() {
        let svc = service().await;
        let draw = svc
            .create_draw(Uuid::new_v4(), condition_request(5))
            .await
            .unwrap();
        set_status(&svc, draw.id, DrawStatus::Closed).await;

        assert!(matches!(
            write_cancel(&svc.pool, &draw, DrawStatus::Closed).await,
            Err(AppError::InvalidTransition {
                from: DrawStatus::Closed,
                action: DrawAction::Cancel
            })
        ));

        svc.delete_draw(draw.id, None).await.unwrap();
        assert!(matches!(
            write_soft_delete(&svc.pool, draw.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
