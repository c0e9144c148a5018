use crate::{
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel, Topic},
    services::topic::check_message_length,
    utils::validation::require_fields,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub const MSG_EMPTY_REPLY: &str = "Please enter a comment before sending.";

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_by_topic(&self, topic_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::TopicId.eq(topic_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        topic_id: i32,
        author_id: i32,
        reply: Option<&str>,
    ) -> AppResult<CommentModel> {
        Topic::find_by_id(topic_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        require_fields(&[reply]).map_err(|_| AppError::validation(MSG_EMPTY_REPLY))?;
        let reply = reply.unwrap_or_default().trim();
        check_message_length(reply)?;

        let new_comment = comment::ActiveModel {
            topic_id: sea_orm::ActiveValue::Set(topic_id),
            author_id: sea_orm::ActiveValue::Set(author_id),
            message: sea_orm::ActiveValue::Set(reply.to_string()),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }
}
