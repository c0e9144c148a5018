use crate::{
    error::{AppError, AppResult},
    models::{comment, topic, Comment, CommentModel, Topic, TopicModel, User, UserModel},
    services::comment::CommentService,
    utils::{render_markdown, validation::require_fields},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const TITLE_MAX_CHARS: usize = 100;
pub const MESSAGE_MAX_CHARS: usize = 1000;

pub const MSG_TOPIC_FIELDS: &str = "Please enter a title and a message.";
pub const MSG_TITLE_TOO_LONG: &str = "The title can't be longer than 100 characters.";
pub const MSG_MESSAGE_TOO_LONG: &str = "The message can't be longer than 1000 characters.";

/// Who wrote a topic or comment, as shown next to it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorView {
    pub id: i32,
    pub name: String,
    pub level: String,
    pub avatar_url: Option<String>,
}

impl AuthorView {
    fn unknown(id: i32) -> Self {
        Self {
            id,
            name: String::new(),
            level: String::new(),
            avatar_url: None,
        }
    }
}

impl From<&UserModel> for AuthorView {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            name: user.full_name(),
            level: user.level_label().to_string(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentView {
    pub id: i32,
    pub message: String,
    pub message_html: String,
    pub created_at: chrono::NaiveDateTime,
    pub author: AuthorView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopicDetail {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub message_html: String,
    pub solved: bool,
    pub created_at: chrono::NaiveDateTime,
    pub author: AuthorView,
    pub comments: Vec<CommentView>,
}

/// Fetch the authors of a batch of rows in one query.
pub(crate) async fn load_authors<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = i32>,
) -> AppResult<HashMap<i32, AuthorView>> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find()
        .filter(crate::models::user::Column::Id.is_in(ids))
        .all(conn)
        .await?;

    Ok(users.iter().map(|u| (u.id, AuthorView::from(u))).collect())
}

pub(crate) fn author_or_unknown(authors: &HashMap<i32, AuthorView>, id: i32) -> AuthorView {
    authors
        .get(&id)
        .cloned()
        .unwrap_or_else(|| AuthorView::unknown(id))
}

pub(crate) fn check_message_length(message: &str) -> AppResult<()> {
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(AppError::validation(MSG_MESSAGE_TOO_LONG));
    }
    Ok(())
}

pub struct TopicService {
    db: DatabaseConnection,
}

impl TopicService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<TopicModel> {
        Topic::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        author_id: i32,
        title: Option<&str>,
        message: Option<&str>,
    ) -> AppResult<TopicModel> {
        require_fields(&[title, message]).map_err(|_| AppError::validation(MSG_TOPIC_FIELDS))?;
        let (title, message) = (
            title.unwrap_or_default().trim(),
            message.unwrap_or_default().trim(),
        );

        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(AppError::validation(MSG_TITLE_TOO_LONG));
        }
        check_message_length(message)?;

        let new_topic = topic::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            author_id: sea_orm::ActiveValue::Set(author_id),
            message: sea_orm::ActiveValue::Set(message.to_string()),
            solved: sea_orm::ActiveValue::Set(false),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let topic = new_topic.insert(&self.db).await?;
        tracing::debug!(topic_id = topic.id, author_id, "Topic created");
        Ok(topic)
    }

    /// The topic with its author and its comments, oldest first.
    pub async fn detail(&self, id: i32) -> AppResult<TopicDetail> {
        let topic = self.get_by_id(id).await?;
        let comments = CommentService::new(self.db.clone())
            .list_by_topic(topic.id)
            .await?;

        let authors = load_authors(
            &self.db,
            std::iter::once(topic.author_id).chain(comments.iter().map(|c| c.author_id)),
        )
        .await?;

        let comments = comments
            .into_iter()
            .map(|c: CommentModel| CommentView {
                id: c.id,
                message_html: render_markdown(&c.message),
                message: c.message,
                created_at: c.created_at,
                author: author_or_unknown(&authors, c.author_id),
            })
            .collect();

        Ok(TopicDetail {
            id: topic.id,
            title: topic.title,
            message_html: render_markdown(&topic.message),
            message: topic.message,
            solved: topic.solved,
            created_at: topic.created_at,
            author: author_or_unknown(&authors, topic.author_id),
            comments,
        })
    }

    /// Flip the solved flag. Only the topic's author may do this.
    pub async fn toggle_solved(&self, id: i32, user_id: i32) -> AppResult<TopicModel> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let solved = !existing.solved;
        let mut active: topic::ActiveModel = existing.into();
        active.solved = sea_orm::ActiveValue::Set(solved);
        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Remove a topic and its comments. Only the topic's author may do this.
    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.author_id != user_id {
            return Err(AppError::Forbidden);
        }

        let txn = self.db.begin().await?;
        Comment::delete_many()
            .filter(comment::Column::TopicId.eq(id))
            .exec(&txn)
            .await?;
        Topic::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(topic_id = id, user_id, "Topic deleted");
        Ok(())
    }
}
