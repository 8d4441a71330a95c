use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entities::{DrawStatus, DrawType, draw_entity as draws};

use super::UserInfo;

/// 抽奖列表查询参数
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DrawListQuery {
    /// 商家ID（携带 X-Business-ID 时可省略）
    pub business_id: Option<Uuid>,
    /// 按状态过滤
    pub status: Option<DrawStatus>,
    /// 页码 (默认 1)
    pub page: Option<u64>,
    /// 每页数量 (默认 20)
    #[serde(alias = "limit")]
    pub per_page: Option<u64>,
}

/// 创建抽奖请求
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateDrawRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub draw_type: DrawType,
    /// fixed_date 类型必填
    pub draw_date: Option<DateTime<Utc>>,
    /// condition 类型的参与人数阈值
    pub trigger_value: Option<i32>,
    /// 0 - 100，默认 0
    pub winning_probability: Option<f64>,
    /// 携带 X-Business-ID 时可省略
    pub business_id: Option<Uuid>,
    /// 初始状态，只能是 draft 或 active（默认 active）
    pub status: Option<DrawStatus>,
}

/// 修改抽奖请求（整体替换可编辑字段）
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateDrawRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub draw_type: DrawType,
    pub draw_date: Option<DateTime<Utc>>,
    pub trigger_value: Option<i32>,
    /// 省略则保留原值
    pub winning_probability: Option<f64>,
    /// 只允许 draft -> active 或保持不变
    pub status: Option<DrawStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResponse {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub draw_type: DrawType,
    pub draw_date: Option<DateTime<Utc>>,
    pub trigger_value: Option<i32>,
    pub winning_probability: f64,
    pub status: DrawStatus,
    pub winner_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<draws::Model> for DrawResponse {
    fn from(m: draws::Model) -> Self {
        DrawResponse {
            id: m.id,
            business_id: m.business_id,
            title: m.title,
            description: m.description,
            draw_type: m.draw_type,
            draw_date: m.draw_date,
            trigger_value: m.trigger_value,
            winning_probability: m.winning_probability,
            status: m.status,
            winner_user_id: m.winner_user_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// 抽奖详情：附带参与人数与中奖者信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawDetailResponse {
    #[serde(flatten)]
    pub draw: DrawResponse,
    pub participant_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<UserInfo>,
    /// 中奖者信息获取失败时的说明
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_error: Option<String>,
}

/// close 的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CloseDrawResponse {
    pub draw_id: Uuid,
    pub status: DrawStatus,
    pub participant_count: u64,
}

/// complete / publish 的结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawResultResponse {
    pub draw_id: Uuid,
    pub status: DrawStatus,
    pub winner_user_id: Option<String>,
    pub winner: Option<UserInfo>,
    pub total_participants: u64,
    pub is_automatic_winner: bool,
}
