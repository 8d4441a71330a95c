use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::external::ProviderUser;

use super::BusinessSummary;

/// 用外部认证服务的 access token 换取本服务的会话令牌
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ExchangeTokenRequest {
    #[serde(alias = "supabase_token")]
    pub provider_token: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExchangeTokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// 秒
    pub expires_in: i64,
    pub user: ProviderUser,
    pub default_business: BusinessSummary,
}

/// 对外展示的用户信息
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    #[schema(value_type = Object)]
    pub user_metadata: serde_json::Value,
}

impl From<ProviderUser> for UserInfo {
    fn from(u: ProviderUser) -> Self {
        let name = u.display_name();
        UserInfo {
            id: u.id,
            email: u.email,
            name,
            user_metadata: u.user_metadata,
        }
    }
}
