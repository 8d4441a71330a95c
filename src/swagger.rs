use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{DrawStatus, DrawType};
use crate::external::ProviderUser;
use crate::handlers;
use crate::handlers::system::HealthResponse;
use crate::middlewares::BUSINESS_ID_HEADER;
use crate::models::*;
use crate::services::lifecycle::DrawAction;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
        components.add_security_scheme(
            "business_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(BUSINESS_ID_HEADER))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::system::health,
        handlers::auth::exchange,
        handlers::restaurant::me,
        handlers::draw::list_draws,
        handlers::draw::create_draw,
        handlers::draw::get_draw,
        handlers::draw::update_draw,
        handlers::draw::delete_draw,
        handlers::draw::close_draw,
        handlers::draw::complete_draw,
        handlers::draw::publish_draw,
        handlers::draw::cancel_draw,
        handlers::participant::join_draw,
        handlers::participant::list_participants,
        handlers::participant::list_participants_with_users,
    ),
    components(
        schemas(
            DrawType,
            DrawStatus,
            DrawAction,
            DrawListQuery,
            CreateDrawRequest,
            UpdateDrawRequest,
            DrawResponse,
            DrawDetailResponse,
            CloseDrawResponse,
            DrawResultResponse,
            ParticipantResponse,
            CompletionSummary,
            JoinDrawResponse,
            ParticipantWithUser,
            ParticipantsWithUsersResponse,
            PaginationParams,
            PaginatedDrawResponse,
            PaginatedParticipantResponse,
            ExchangeTokenRequest,
            ExchangeTokenResponse,
            ProviderUser,
            UserInfo,
            BusinessSummary,
            RestaurantResponse,
            ApiError,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "draws", description = "Draw management API"),
        (name = "participants", description = "Draw participation API"),
        (name = "auth", description = "Session token exchange API"),
        (name = "restaurant", description = "Demo business API"),
        (name = "system", description = "Health check"),
    ),
    info(
        title = "Draw Backend API",
        version = "1.0.0",
        description = "Prize draw backend REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_draw_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/draws",
            "/draws/{id}",
            "/draws/{id}/participants",
            "/draws/{id}/publish",
            "/auth/exchange",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("business_id"));
    }
}
