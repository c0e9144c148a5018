use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::health_check,
        // Auth routes
        crate::handlers::auth::login_page,
        crate::handlers::auth::login,
        crate::handlers::auth::register,
        crate::handlers::auth::logout,
        crate::handlers::auth::request_reset,
        crate::handlers::auth::reset_done,
        crate::handlers::auth::reset_confirm_page,
        crate::handlers::auth::redeem_reset,
        crate::handlers::auth::reset_complete,
        // Profile routes
        crate::handlers::user::get_profile,
        crate::handlers::user::update_profile,
        crate::handlers::user::upload_avatar,
        crate::handlers::user::delete_account,
        // Topic routes
        crate::handlers::topic::list_topics,
        crate::handlers::topic::create_topic,
        crate::handlers::topic::get_topic,
        crate::handlers::topic::add_comment,
        crate::handlers::topic::toggle_solved,
        crate::handlers::topic::delete_topic,
    ),
    components(
        schemas(
            crate::error::AppError,
            // Auth
            crate::handlers::auth::RegisterForm,
            crate::handlers::auth::LoginForm,
            crate::handlers::auth::ResetRequestForm,
            crate::handlers::auth::NewPasswordForm,
            crate::handlers::auth::PageInfo,
            crate::handlers::auth::ResetConfirmPage,
            // Profile
            crate::handlers::user::UpdateProfileForm,
            crate::handlers::user::UploadResponse,
            crate::services::user::ProfileView,
            // Topics
            crate::handlers::topic::CreateTopicForm,
            crate::handlers::topic::ReplyForm,
            crate::services::listing::TopicFilter,
            crate::services::listing::TopicPage,
            crate::services::listing::TopicListItem,
            crate::services::topic::TopicDetail,
            crate::services::topic::CommentView,
            crate::services::topic::AuthorView,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "auth", description = "Login, registration and password reset"),
        (name = "profile", description = "Account of the signed-in user"),
        (name = "topics", description = "Topics and comments"),
    )
)]
pub struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(
                    crate::utils::cookie::SESSION_COOKIE,
                ))),
            );
        }
    }
}
