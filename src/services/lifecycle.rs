//! 抽奖状态机
//!
//! 所有状态变更都经过 [`transition`]，各接口共用的校验写成纯函数放在这里，
//! 本模块不访问数据库。

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{DrawStatus, DrawType, draw_entity as draws};
use crate::error::{AppError, AppResult};

/// 可对抽奖执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DrawAction {
    Activate,
    Update,
    Delete,
    Close,
    Complete,
    Publish,
    Cancel,
    /// 读取/参与时触发的自动开奖
    AutoComplete,
}

impl std::fmt::Display for DrawAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DrawAction::Activate => "activate",
            DrawAction::Update => "update",
            DrawAction::Delete => "delete",
            DrawAction::Close => "close",
            DrawAction::Complete => "complete",
            DrawAction::Publish => "publish",
            DrawAction::Cancel => "cancel",
            DrawAction::AutoComplete => "auto-complete",
        };
        f.write_str(s)
    }
}

/// (当前状态, 动作) -> 下一状态
///
/// | action        | from            | to        |
/// |---------------|-----------------|-----------|
/// | Activate      | draft           | active    |
/// | Close         | active          | closed    |
/// | Complete      | closed          | completed |
/// | Publish       | active, closed  | completed |
/// | Cancel        | draft, active   | closed    |
/// | AutoComplete  | active, closed  | completed |
///
/// Update / Delete 不改变状态，不属于状态迁移
pub fn transition(current: DrawStatus, action: DrawAction) -> AppResult<DrawStatus> {
    use DrawStatus::*;

    let next = match (action, current) {
        (DrawAction::Activate, Draft) => Some(Active),
        (DrawAction::Close, Active) => Some(Closed),
        (DrawAction::Complete, Closed) => Some(Completed),
        (DrawAction::Publish | DrawAction::AutoComplete, Active | Closed) => Some(Completed),
        (DrawAction::Cancel, Draft | Active) => Some(Closed),
        _ => None,
    };

    next.ok_or(AppError::InvalidTransition {
        from: current,
        action,
    })
}

/// 已有参与者的抽奖不可修改 / 删除 / 取消
pub fn ensure_unlocked(participant_count: u64, action: DrawAction) -> AppResult<()> {
    if participant_count > 0 {
        return Err(AppError::DrawLocked {
            action,
            participants: participant_count,
        });
    }
    Ok(())
}

/// 参与前检查: 必须是 active，定时抽奖的开奖时间不能已过
pub fn ensure_joinable(draw: &draws::Model, now: DateTime<Utc>) -> AppResult<()> {
    if draw.status != DrawStatus::Active {
        return Err(AppError::ValidationError(format!(
            "Draw is not active (current status: {})",
            draw.status
        )));
    }
    if draw.draw_type == DrawType::FixedDate
        && let Some(date) = draw.draw_date
        && date < now
    {
        return Err(AppError::ValidationError("Draw date has passed".into()));
    }
    Ok(())
}

/// 定时抽奖必须到达开奖时间后才能公布结果
pub fn ensure_publishable(draw: &draws::Model, now: DateTime<Utc>) -> AppResult<()> {
    if draw.draw_type == DrawType::FixedDate
        && let Some(date) = draw.draw_date
        && now < date
    {
        return Err(AppError::ValidationError(format!(
            "Cannot publish result before draw date ({})",
            date.to_rfc3339()
        )));
    }
    Ok(())
}

/// 是否满足开奖条件
/// - fixed_date: now >= draw_date（未设置日期则永不满足）
/// - condition: 参与人数 >= trigger_value（未设置阈值则永不满足）
pub fn is_due(draw: &draws::Model, participant_count: u64, now: DateTime<Utc>) -> bool {
    match draw.draw_type {
        DrawType::FixedDate => draw.draw_date.is_some_and(|date| now >= date),
        DrawType::Condition => draw
            .trigger_value
            .is_some_and(|target| target > 0 && participant_count >= target as u64),
    }
}

/// 选出的中奖者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerPick {
    pub user_id: String,
    /// 仅一名参与者时自动中奖
    pub automatic: bool,
}

/// 均匀随机选出一名中奖者，无参与者返回 None
pub fn pick_winner<R: Rng + ?Sized>(participants: &[String], rng: &mut R) -> Option<WinnerPick> {
    match participants {
        [] => None,
        [only] => Some(WinnerPick {
            user_id: only.clone(),
            automatic: true,
        }),
        many => {
            let idx = rng.random_range(0..many.len());
            many.get(idx).map(|user_id| WinnerPick {
                user_id: user_id.clone(),
                automatic: false,
            })
        }
    }
}
