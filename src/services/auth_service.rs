use crate::config::DemoBusinessConfig;
use crate::entities::draw_participant_entity as participants;
use crate::error::AppResult;
use crate::external::SupabaseAuthService;
use crate::models::*;
use crate::utils::JwtService;
use futures_util::future::join_all;

/// 身份桥接：外部认证服务 <-> 本地会话令牌
#[derive(Clone)]
pub struct AuthService {
    supabase: SupabaseAuthService,
    jwt_service: JwtService,
    demo_business: DemoBusinessConfig,
}

impl AuthService {
    pub fn new(
        supabase: SupabaseAuthService,
        jwt_service: JwtService,
        demo_business: DemoBusinessConfig,
    ) -> Self {
        Self {
            supabase,
            jwt_service,
            demo_business,
        }
    }

    /// 校验外部 token 后签发本地 access token
    pub async fn exchange_token(&self, request: ExchangeTokenRequest) -> AppResult<ExchangeTokenResponse> {
        let user = self.supabase.verify_token(&request.provider_token).await?;
        let access_token = self.jwt_service.generate_access_token(&user.id)?;

        log::info!("Session token issued for provider user {}", user.id);

        Ok(ExchangeTokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
            user,
            default_business: BusinessSummary::from(&self.demo_business),
        })
    }

    /// 查询用户资料；失败只返回说明文字，不影响主请求
    pub async fn lookup_user(&self, user_id: &str) -> Result<UserInfo, String> {
        match self.supabase.get_user(user_id).await {
            Ok(user) => Ok(UserInfo::from(user)),
            Err(e) => {
                log::warn!("User lookup failed for {user_id}: {e}");
                Err(format!("Failed to load user {user_id}: {e}"))
            }
        }
    }

    /// (user, user_error)
    pub async fn lookup_user_pair(&self, user_id: Option<&str>) -> (Option<UserInfo>, Option<String>) {
        match user_id {
            None => (None, None),
            Some(id) => match self.lookup_user(id).await {
                Ok(user) => (Some(user), None),
                Err(message) => (None, Some(message)),
            },
        }
    }

    /// 为参与记录并发补充用户信息，保持原有顺序
    pub async fn enrich_participants(
        &self,
        list: Vec<participants::Model>,
    ) -> Vec<ParticipantWithUser> {
        let lookups = list.iter().map(|p| self.lookup_user(&p.user_id));
        let users = join_all(lookups).await;

        list.into_iter()
            .zip(users)
            .map(|(participant, user)| {
                let (user, user_error) = match user {
                    Ok(user) => (Some(user), None),
                    Err(message) => (None, Some(message)),
                };
                ParticipantWithUser {
                    participant: ParticipantResponse::from(participant),
                    user,
                    user_error,
                }
            })
            .collect()
    }
}
