use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{DrawStatus, draw_participant_entity as participants};

use super::UserInfo;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub draw_id: Uuid,
    pub user_id: String,
    pub participated_at: DateTime<Utc>,
    pub is_winner: bool,
}

impl From<participants::Model> for ParticipantResponse {
    fn from(m: participants::Model) -> Self {
        ParticipantResponse {
            id: m.id,
            draw_id: m.draw_id,
            user_id: m.user_id,
            participated_at: m.participated_at,
            is_winner: m.is_winner,
        }
    }
}

/// 参与后若触发开奖，返回开奖摘要
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompletionSummary {
    pub status: DrawStatus,
    pub winner_user_id: Option<String>,
    pub total_participants: u64,
    pub is_automatic_winner: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JoinDrawResponse {
    pub participation: ParticipantResponse,
    pub is_winner: bool,
    pub completion: Option<CompletionSummary>,
}

/// 附带外部用户信息的参与记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantWithUser {
    #[serde(flatten)]
    pub participant: ParticipantResponse,
    pub user: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantsWithUsersResponse {
    pub participants: Vec<ParticipantWithUser>,
    pub total: u64,
}
