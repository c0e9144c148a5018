use crate::{
    config::session::SessionConfig,
    error::{AppError, AppResult},
    models::{session, Session, User, UserModel},
    utils::{generate_token, hash_token},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Maps opaque session tokens to users. The raw token goes to the client,
/// only its digest is stored.
pub struct SessionService {
    db: DatabaseConnection,
    config: SessionConfig,
}

impl SessionService {
    pub fn new(db: DatabaseConnection, config: SessionConfig) -> Self {
        Self { db, config }
    }

    /// Open a session for `user_id` and return the raw token.
    pub async fn create(&self, user_id: i32) -> AppResult<String> {
        let token = generate_token()?;
        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::seconds(self.config.ttl_seconds);

        let model = session::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            token_hash: sea_orm::ActiveValue::Set(hash_token(&token)),
            expires_at: sea_orm::ActiveValue::Set(expires_at),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        model.insert(&self.db).await?;

        tracing::info!(user_id, "Session created");
        Ok(token)
    }

    /// Resolve a raw token to its user. Expired sessions are removed on sight.
    pub async fn authenticate(&self, token: &str) -> AppResult<UserModel> {
        let (existing, user) = Session::find()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .find_also_related(User)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if existing.expires_at <= chrono::Utc::now().naive_utc() {
            Session::delete_by_id(existing.id).exec(&self.db).await?;
            return Err(AppError::Unauthorized);
        }

        user.ok_or(AppError::Unauthorized)
    }

    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        Session::delete_many()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

/// Delete every session of `user_id`; usable inside a transaction.
pub(crate) async fn revoke_all_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> AppResult<()> {
    Session::delete_many()
        .filter(session::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}
