use crate::config::AuthProviderConfig;
use crate::error::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 外部认证服务中的用户（后端不保存用户资料）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub user_metadata: serde_json::Value,
}

impl ProviderUser {
    /// user_metadata.name（若有）
    pub fn display_name(&self) -> Option<String> {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

/// admin 接口返回 `{ "user": {...} }` 或直接返回用户对象，两种都兼容
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdminUserResponse {
    Wrapped { user: ProviderUser },
    Bare(ProviderUser),
}

/// Supabase Auth REST 客户端
#[derive(Clone)]
pub struct SupabaseAuthService {
    http: Client,
    config: AuthProviderConfig,
}

impl SupabaseAuthService {
    pub fn new(config: AuthProviderConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("draw-backend/auth")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url.trim_end_matches('/'), path)
    }

    /// 校验客户端提交的 access token，返回对应用户
    pub async fn verify_token(&self, token: &str) -> AppResult<ProviderUser> {
        if token.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Provider token is required".to_string(),
            ));
        }

        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.config.service_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            log::warn!("Auth provider rejected token: HTTP {}", status.as_u16());
            return Err(AppError::AuthError("Invalid provider token".to_string()));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Auth provider token check failed: HTTP {status}: {error_text}");
            return Err(AppError::ExternalApiError(format!(
                "Token verification failed: HTTP {}",
                status.as_u16()
            )));
        }

        let user: ProviderUser = response.json().await?;
        if user.id.is_empty() {
            return Err(AppError::AuthError("No user found in token".to_string()));
        }
        Ok(user)
    }

    /// 按 id 查询用户（service key 权限）
    pub async fn get_user(&self, user_id: &str) -> AppResult<ProviderUser> {
        let response = self
            .http
            .get(self.endpoint(&format!("admin/users/{user_id}")))
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "User lookup failed: HTTP {}",
                status.as_u16()
            )));
        }

        match response.json::<AdminUserResponse>().await? {
            AdminUserResponse::Wrapped { user } | AdminUserResponse::Bare(user) => Ok(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let svc = SupabaseAuthService::new(AuthProviderConfig {
            url: "https://abc.supabase.co/".into(),
            service_key: "k".into(),
        })
        .unwrap();
        assert_eq!(svc.endpoint("user"), "https://abc.supabase.co/auth/v1/user");
    }

    #[test]
    fn test_admin_response_shapes() {
        let wrapped: AdminUserResponse = serde_json::from_value(json!({
            "user": { "id": "u1", "email": "a@b.c", "user_metadata": { "name": "Ana" } }
        }))
        .unwrap();
        let bare: AdminUserResponse =
            serde_json::from_value(json!({ "id": "u2", "email": null })).unwrap();

        match wrapped {
            AdminUserResponse::Wrapped { user } => {
                assert_eq!(user.id, "u1");
                assert_eq!(user.display_name().as_deref(), Some("Ana"));
            }
            AdminUserResponse::Bare(_) => panic!("expected wrapped shape"),
        }
        match bare {
            AdminUserResponse::Bare(user) => {
                assert_eq!(user.id, "u2");
                assert_eq!(user.display_name(), None);
            }
            AdminUserResponse::Wrapped { .. } => panic!("expected bare shape"),
        }
    }
}
