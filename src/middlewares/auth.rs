use crate::error::{AppError, AppResult};
use crate::utils::JwtService;
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use uuid::Uuid;

pub const BUSINESS_ID_HEADER: &str = "X-Business-ID";

/// 已通过 Bearer 令牌认证的外部用户 id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// 通过 X-Business-ID 认证的演示商家
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorBusiness(pub Uuid);

// 公开路径配置
struct PublicPaths {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
}

impl PublicPaths {
    fn new() -> Self {
        Self {
            exact_paths: vec![
                "/swagger-ui",
                "/swagger-ui/",
                "/api-docs/openapi.json",
                "/api/v1/health",
            ],
            prefix_paths: vec!["/swagger-ui/", "/api-docs/", "/api/v1/auth/"],
        }
    }

    fn is_public_path(&self, path: &str) -> bool {
        if self.exact_paths.contains(&path) {
            return true;
        }
        self.prefix_paths
            .iter()
            .any(|&prefix| path.starts_with(prefix))
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
    demo_business_id: Uuid,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService, demo_business_id: Uuid) -> Self {
        Self {
            jwt_service,
            demo_business_id,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            demo_business_id: self.demo_business_id,
            public_paths: PublicPaths::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    demo_business_id: Uuid,
    public_paths: PublicPaths,
}

impl<S> AuthMiddlewareService<S> {
    /// 解析请求携带的身份；两种都没有时返回 (None, None)
    fn resolve_identity(
        &self,
        req: &ServiceRequest,
    ) -> AppResult<(Option<AuthUser>, Option<OperatorBusiness>)> {
        let user = match bearer_token(req) {
            Some(token) => {
                let claims = self.jwt_service.verify_access_token(token).map_err(|e| {
                    log::debug!("Rejected bearer token: {e}");
                    AppError::AuthError("Invalid access token".to_string())
                })?;
                Some(AuthUser(claims.sub))
            }
            None => None,
        };

        let operator = match req.headers().get(BUSINESS_ID_HEADER) {
            Some(value) => {
                let business_id = value
                    .to_str()
                    .ok()
                    .and_then(|v| Uuid::parse_str(v.trim()).ok())
                    .ok_or_else(|| AppError::AuthError("Invalid business id header".to_string()))?;
                // 未配置演示商家（nil）时该方式不可用
                if business_id.is_nil() || business_id != self.demo_business_id {
                    return Err(AppError::AuthError("Unknown business id".to_string()));
                }
                Some(OperatorBusiness(business_id))
            }
            None => None,
        };

        Ok((user, operator))
    }
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS || self.public_paths.is_public_path(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let (user, operator) = match self.resolve_identity(&req) {
            Ok(identity) => identity,
            Err(error) => return Box::pin(async move { Err(error.into()) }),
        };

        if user.is_none() && operator.is_none() {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        }

        if let Some(user) = user {
            req.extensions_mut().insert(user);
        }
        if let Some(operator) = operator {
            req.extensions_mut().insert(operator);
        }

        let fut = self.service.call(req);
        Box::pin(fut)
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 当前 Bearer 用户，没有则 401
pub fn current_user(req: &HttpRequest) -> AppResult<String> {
    req.extensions()
        .get::<AuthUser>()
        .map(|user| user.0.clone())
        .ok_or_else(|| AppError::AuthError("User authentication required".to_string()))
}

/// X-Business-ID 认证的商家（若有）
pub fn operator_business(req: &HttpRequest) -> Option<Uuid> {
    req.extensions().get::<OperatorBusiness>().map(|b| b.0)
}
