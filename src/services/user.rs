use crate::{
    error::{AppError, AppResult},
    models::{comment, session, topic, user, Comment, Session, Topic, User, UserModel},
    utils::validation::{require_fields, require_valid_email, MSG_EMAIL_TAKEN},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

/// What the profile page shows about the signed-in account.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub level: String,
    pub level_label: String,
    pub avatar_url: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<UserModel> for ProfileView {
    fn from(user: UserModel) -> Self {
        Self {
            level_label: user.level_label().to_string(),
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            level: user.level,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, user_id: i32) -> AppResult<UserModel> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn update_profile(
        &self,
        user_id: i32,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> AppResult<UserModel> {
        require_fields(&[email, first_name, last_name])?;
        let (email, first_name, last_name) = (
            email.unwrap_or_default(),
            first_name.unwrap_or_default().trim(),
            last_name.unwrap_or_default().trim(),
        );
        require_valid_email(email)?;

        let existing = self.get_by_id(user_id).await?;

        if existing.email != email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email))
                .filter(user::Column::Id.ne(user_id))
                .one(&self.db)
                .await?
                .is_some();
            if taken {
                return Err(AppError::Conflict(MSG_EMAIL_TAKEN.to_string()));
            }
        }

        let mut active: user::ActiveModel = existing.into();
        active.email = sea_orm::ActiveValue::Set(email.to_string());
        active.first_name = sea_orm::ActiveValue::Set(first_name.to_string());
        active.last_name = sea_orm::ActiveValue::Set(last_name.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Update only the avatar URL (used by upload handler).
    pub async fn update_avatar_url(&self, user_id: i32, url: &str) -> AppResult<UserModel> {
        let existing = self.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = existing.into();
        active.avatar_url = sea_orm::ActiveValue::Set(Some(url.to_string()));
        active.updated_at = sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc());

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Delete the account and everything hanging off it, in one transaction:
    /// sessions, comments on the user's topics, the user's own comments, the
    /// user's topics, then the user.
    pub async fn delete_account(&self, user_id: i32) -> AppResult<()> {
        self.get_by_id(user_id).await?;

        let txn = self.db.begin().await?;

        Session::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let topic_ids: Vec<i32> = Topic::find()
            .select_only()
            .column(topic::Column::Id)
            .filter(topic::Column::AuthorId.eq(user_id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !topic_ids.is_empty() {
            Comment::delete_many()
                .filter(comment::Column::TopicId.is_in(topic_ids))
                .exec(&txn)
                .await?;
        }

        Comment::delete_many()
            .filter(comment::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await?;

        Topic::delete_many()
            .filter(topic::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await?;

        User::delete_by_id(user_id).exec(&txn).await?;

        txn.commit().await?;
        tracing::info!(user_id, "Account deleted");
        Ok(())
    }
}
