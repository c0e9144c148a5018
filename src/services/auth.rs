use crate::{
    error::{AppError, AppResult},
    models::{user, Level, User, UserModel},
    services::{email::EmailService, session},
    utils::{
        generate_token, hash_password, hash_token, passwords_match,
        validation::{
            default_first_name, require_fields, require_valid_email, MSG_EMAIL_TAKEN,
            MSG_PASSWORD_MISMATCH,
        },
        verify_password,
    },
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};

/// How long an emailed reset link stays usable.
pub const RESET_TOKEN_VALIDITY_MINUTES: i64 = 10;

/// A reset token issued at `issued_at` is usable strictly before the window
/// closes; at exactly ten minutes it is already expired.
pub fn is_reset_token_fresh(issued_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    now - issued_at < chrono::Duration::minutes(RESET_TOKEN_VALIDITY_MINUTES)
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a `newbie` account named after the email's local part.
    pub async fn register(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> AppResult<UserModel> {
        require_fields(&[email, password, confirm_password])?;
        let (email, password, confirm_password) = (
            email.unwrap_or_default(),
            password.unwrap_or_default(),
            confirm_password.unwrap_or_default(),
        );

        require_valid_email(email)?;

        if self.email_exists(email).await? {
            return Err(AppError::Conflict(MSG_EMAIL_TAKEN.to_string()));
        }

        if !passwords_match(password, confirm_password) {
            return Err(AppError::validation(MSG_PASSWORD_MISMATCH));
        }

        let password_hash = hash_password(password)?;
        let now = chrono::Utc::now().naive_utc();

        let new_user = user::ActiveModel {
            email: sea_orm::ActiveValue::Set(email.to_string()),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            first_name: sea_orm::ActiveValue::Set(default_first_name(email)),
            last_name: sea_orm::ActiveValue::Set(String::new()),
            level: sea_orm::ActiveValue::Set(Level::Newbie.code().to_string()),
            avatar_url: sea_orm::ActiveValue::Set(None),
            reset_pwd_hash: sea_orm::ActiveValue::Set(None),
            reset_pwd_time: sea_orm::ActiveValue::Set(None),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = new_user.insert(&self.db).await?;
        tracing::info!(user_id = user.id, "Account registered");
        Ok(user)
    }

    /// Check credentials. Unknown emails and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login(&self, email: Option<&str>, password: Option<&str>) -> AppResult<UserModel> {
        require_fields(&[email, password])?;
        let (email, password) = (email.unwrap_or_default(), password.unwrap_or_default());

        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Issue a reset token and mail it. Succeeds silently for unknown
    /// addresses so the response never reveals whether an account exists.
    pub async fn request_reset(&self, email: &str, email_service: &EmailService) -> AppResult<()> {
        require_valid_email(email)?;

        let Some(user) = self.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown address");
            return Ok(());
        };

        let token = generate_token()?;
        let now = chrono::Utc::now().naive_utc();

        let user_id = user.id;
        let user_email = user.email.clone();
        let mut active: user::ActiveModel = user.into();
        active.reset_pwd_hash = sea_orm::ActiveValue::Set(Some(hash_token(&token)));
        active.reset_pwd_time = sea_orm::ActiveValue::Set(Some(now));
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&self.db).await?;
        tracing::info!(user_id, "Password reset token issued");

        if let Err(e) = email_service
            .send_password_reset_email(&user_email, &token)
            .await
        {
            tracing::warn!("Failed to send password reset email: {e}");
        }

        Ok(())
    }

    /// Whether `token` currently authorizes a password change. Read-only.
    pub async fn check_reset_token(&self, token: &str) -> AppResult<bool> {
        self.check_reset_token_at(token, chrono::Utc::now().naive_utc())
            .await
    }

    pub async fn check_reset_token_at(&self, token: &str, now: NaiveDateTime) -> AppResult<bool> {
        Ok(self.find_by_valid_reset_token(token, now).await?.is_some())
    }

    /// Redeem a reset token: set the new password, clear the token and end
    /// every open session of the account.
    ///
    /// The token is read and then cleared in two steps, so two concurrent
    /// redemptions of the same token may both succeed (last write wins).
    pub async fn redeem_reset(
        &self,
        token: &str,
        new_password: Option<&str>,
        confirm_password: Option<&str>,
    ) -> AppResult<()> {
        self.redeem_reset_at(
            token,
            new_password,
            confirm_password,
            chrono::Utc::now().naive_utc(),
        )
        .await
    }

    pub async fn redeem_reset_at(
        &self,
        token: &str,
        new_password: Option<&str>,
        confirm_password: Option<&str>,
        now: NaiveDateTime,
    ) -> AppResult<()> {
        require_fields(&[new_password, confirm_password])?;
        let (new_password, confirm_password) = (
            new_password.unwrap_or_default(),
            confirm_password.unwrap_or_default(),
        );
        if !passwords_match(new_password, confirm_password) {
            return Err(AppError::validation(MSG_PASSWORD_MISMATCH));
        }

        let user = self
            .find_by_valid_reset_token(token, now)
            .await?
            .ok_or(AppError::InvalidToken)?;
        let user_id = user.id;

        let new_hash = hash_password(new_password)?;

        let txn = self.db.begin().await?;
        let mut active: user::ActiveModel = user.into();
        active.password_hash = sea_orm::ActiveValue::Set(new_hash);
        active.reset_pwd_hash = sea_orm::ActiveValue::Set(None);
        active.reset_pwd_time = sea_orm::ActiveValue::Set(None);
        active.updated_at = sea_orm::ActiveValue::Set(now);
        active.update(&txn).await?;
        session::revoke_all_for_user(&txn, user_id).await?;
        txn.commit().await?;

        tracing::info!(user_id, "Password reset redeemed");
        Ok(())
    }

    async fn find_by_valid_reset_token(
        &self,
        token: &str,
        now: NaiveDateTime,
    ) -> AppResult<Option<UserModel>> {
        if token.is_empty() {
            return Ok(None);
        }

        let user = User::find()
            .filter(user::Column::ResetPwdHash.eq(hash_token(token)))
            .one(&self.db)
            .await?;

        Ok(user.filter(|u| {
            u.reset_pwd_time
                .map(|issued_at| is_reset_token_fresh(issued_at, now))
                .unwrap_or(false)
        }))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let count = User::find()
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }
}
