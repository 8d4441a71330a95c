use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 开奖方式
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum DrawType {
    /// 到达 draw_date 后开奖
    #[sea_orm(string_value = "fixed_date")]
    FixedDate,
    /// 参与人数达到 trigger_value 后开奖
    #[sea_orm(string_value = "condition")]
    Condition,
}

impl std::fmt::Display for DrawType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawType::FixedDate => write!(f, "fixed_date"),
            DrawType::Condition => write!(f, "condition"),
        }
    }
}

/// 抽奖状态: draft -> active -> closed -> completed
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "snake_case")]
pub enum DrawStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "closed")]
    Closed,
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl std::fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawStatus::Draft => write!(f, "draft"),
            DrawStatus::Active => write!(f, "active"),
            DrawStatus::Closed => write!(f, "closed"),
            DrawStatus::Completed => write!(f, "completed"),
        }
    }
}

/// 抽奖实体
/// 说明:
/// - winner_user_id 仅在 status = completed 时有值
/// - is_active = false 表示已软删除，对所有接口不可见
/// - winning_probability 仅存储展示，不参与开奖
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "draws")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub draw_type: DrawType,
    pub draw_date: Option<DateTime<Utc>>,
    pub trigger_value: Option<i32>,
    pub winning_probability: f64,
    pub status: DrawStatus,
    /// 外部认证服务中的用户ID
    pub winner_user_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::draw_participants::Entity")]
    Participants,
}

impl Related<super::draw_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
