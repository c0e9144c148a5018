use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::response::{page, redirect, redirect_with_flash};
use crate::routes::paths;
use crate::services::comment::CommentService;
use crate::services::listing::{ListingOutcome, ListingQuery, ListingService, TopicFilter, TopicPage};
use crate::services::topic::{TopicDetail, TopicService};
use crate::utils::flash::Flash;
use anyhow::Context;
use axum::{
    extract::{Path, Query},
    response::Response,
    Extension, Form,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const MSG_TOPIC_CREATED: &str = "New topic created successfully.";
pub const MSG_COMMENT_CREATED: &str = "New comment created successfully.";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TopicListParams {
    /// `all`, `solved`, `unsolved` or `no_replies`
    pub filter: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// Case-insensitive text matched against titles and messages
    pub search: Option<String>,
}

impl TopicListParams {
    fn into_query(self) -> ListingQuery {
        ListingQuery {
            filter: TopicFilter::parse(self.filter.as_deref()),
            page: self
                .page
                .as_deref()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(1),
            search: self.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Serialize)]
struct ListingLocation<'a> {
    filter: &'a str,
    page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

/// Listing URL for `page`, keeping the filter and search of `query`.
fn listing_location(query: &ListingQuery, page: i64) -> AppResult<String> {
    let qs = serde_urlencoded::to_string(ListingLocation {
        filter: query.filter.as_str(),
        page,
        search: query.search.as_deref(),
    })
    .context("Failed to encode listing query")?;
    Ok(format!("{}?{}", paths::TOPICS, qs))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTopicForm {
    pub title: Option<String>,
    /// Topic message
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyForm {
    pub reply: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/topics",
    security(("session" = [])),
    params(TopicListParams),
    responses(
        (status = 200, description = "One page of topics, newest first", body = TopicPage),
        (status = 303, description = "Requested page out of range, redirect to the nearest valid page"),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "topics"
)]
pub async fn list_topics(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Query(params): Query<TopicListParams>,
    flash: Flash,
) -> AppResult<Response> {
    let query = params.into_query();

    match ListingService::new(db).list(&query).await? {
        ListingOutcome::Page(topics) => page(topics, flash),
        ListingOutcome::Redirect { page: target } => {
            Ok(redirect(&listing_location(&query, target)?))
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/topics",
    security(("session" = [])),
    request_body(content = CreateTopicForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Topic created, redirect to its page"),
        (status = 400, description = "Missing or too long title/message", body = AppError),
    ),
    tag = "topics"
)]
pub async fn create_topic(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Form(form): Form<CreateTopicForm>,
) -> AppResult<Response> {
    let topic = TopicService::new(db)
        .create(
            auth_user.user_id,
            form.title.as_deref(),
            form.description.as_deref(),
        )
        .await?;

    redirect_with_flash(&paths::topic(topic.id), MSG_TOPIC_CREATED)
}

#[utoipa::path(
    get,
    path = "/api/v1/topics/{id}",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Topic ID")),
    responses(
        (status = 200, description = "Topic with its comments, oldest first", body = TopicDetail),
        (status = 404, description = "Topic not found", body = AppError),
    ),
    tag = "topics"
)]
pub async fn get_topic(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Path(id): Path<i32>,
    flash: Flash,
) -> AppResult<Response> {
    let detail = TopicService::new(db).detail(id).await?;
    page(detail, flash)
}

#[utoipa::path(
    post,
    path = "/api/v1/topics/{id}",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Topic ID")),
    request_body(content = ReplyForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment added, redirect to the topic"),
        (status = 400, description = "Empty or too long reply", body = AppError),
        (status = 404, description = "Topic not found", body = AppError),
    ),
    tag = "topics"
)]
pub async fn add_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Form(form): Form<ReplyForm>,
) -> AppResult<Response> {
    CommentService::new(db)
        .create(id, auth_user.user_id, form.reply.as_deref())
        .await?;

    redirect_with_flash(&paths::topic(id), MSG_COMMENT_CREATED)
}

#[utoipa::path(
    post,
    path = "/api/v1/topics/{id}/solved",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Topic ID")),
    responses(
        (status = 303, description = "Solved flag flipped, redirect to the topic"),
        (status = 403, description = "Not the topic's author", body = AppError),
        (status = 404, description = "Topic not found", body = AppError),
    ),
    tag = "topics"
)]
pub async fn toggle_solved(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    TopicService::new(db)
        .toggle_solved(id, auth_user.user_id)
        .await?;
    Ok(redirect(&paths::topic(id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/topics/{id}/delete",
    security(("session" = [])),
    params(("id" = i32, Path, description = "Topic ID")),
    responses(
        (status = 303, description = "Topic and its comments deleted, redirect to the list"),
        (status = 403, description = "Not the topic's author", body = AppError),
        (status = 404, description = "Topic not found", body = AppError),
    ),
    tag = "topics"
)]
pub async fn delete_topic(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Response> {
    TopicService::new(db).delete(id, auth_user.user_id).await?;
    Ok(redirect(paths::TOPICS))
}
