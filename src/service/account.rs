use chrono::{DateTime, Utc};
use entity::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};

use crate::{
    Error, Result,
    auth::{PasswordHasher, TokenIssuer, TokenKind, TokenPair, validate_email, validate_password},
};

pub const USERNAME_TAKEN: &str = "Username already used";
pub const EMAIL_TAKEN: &str = "Email already used";
pub const USERNAME_OR_EMAIL_TAKEN: &str = "Username or email already used";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const INVALID_PASSWORD: &str = "Invalid password";
pub const MISSING_LOGIN: &str = "Either username or email must be provided";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    /// Upload reference of the profile picture, already written by the caller
    pub picture: Option<String>,
}

/// How a user names themselves at login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginId {
    Email(String),
    Username(String),
}

impl LoginId {
    /// Email wins when both are given; blank values count as absent.
    pub fn from_parts(username: Option<String>, email: Option<String>) -> Result<Self> {
        let present = |s: &String| !s.trim().is_empty();
        match (username.filter(present), email.filter(present)) {
            (_, Some(email)) => Ok(Self::Email(email)),
            (Some(username), None) => Ok(Self::Username(username)),
            (None, None) => Err(Error::invalid(MISSING_LOGIN)),
        }
    }
}

/// Fields left `None` (or empty) keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatedProfile {
    pub user: user::Model,
    /// The picture reference that was overwritten, now unreferenced
    pub replaced_picture: Option<String>,
}

/// Sign-up, login, token refresh and profile maintenance.
#[derive(Debug)]
pub struct Accounts<'a, C> {
    db: &'a C,
    hasher: PasswordHasher,
    tokens: &'a TokenIssuer,
}

impl<'a, C> Accounts<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C, hasher: PasswordHasher, tokens: &'a TokenIssuer) -> Self {
        Self { db, hasher, tokens }
    }

    /// Create a user. Checks, in order: required fields, username unused,
    /// email format, password length, password strength, email unused.
    pub async fn sign_up(&self, form: SignUp) -> Result<user::Model> {
        if form.username.trim().is_empty() {
            return Err(Error::invalid("username is required"));
        }
        if form.email.is_empty() {
            return Err(Error::invalid("email is required"));
        }
        if form.password.is_empty() {
            return Err(Error::invalid("password is required"));
        }

        if self.find_by_username(&form.username).await?.is_some() {
            return Err(Error::conflict(USERNAME_TAKEN));
        }
        validate_email(&form.email)?;
        validate_password(&form.password)?;
        if self.find_by_email(&form.email).await?.is_some() {
            return Err(Error::conflict(EMAIL_TAKEN));
        }

        let password = self.hasher.hash(&form.password).await?;

        let user = user::ActiveModel {
            username: Set(form.username),
            email: Set(form.email),
            password: Set(password),
            bio: Set(form.bio.filter(|s| !s.is_empty())),
            picture: Set(form.picture),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(|e| Error::on_unique_violation(e, USERNAME_OR_EMAIL_TAKEN))?;

        tracing::info!(user = user.id, username = %user.username, "signed up");
        Ok(user)
    }

    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn login(&self, id: LoginId, password: &str, now: DateTime<Utc>) -> Result<TokenPair> {
        let user = match &id {
            LoginId::Email(email) => self.find_by_email(email).await?,
            LoginId::Username(username) => self.find_by_username(username).await?,
        };

        let Some(user) = user else {
            tracing::debug!(?id, "login for unknown user");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(password, &user.password).await? {
            tracing::debug!(user = user.id, "login with wrong password");
            return Err(Error::unauthenticated(INVALID_CREDENTIALS));
        }

        tracing::info!(user = user.id, "logged in");
        self.tokens.issue_pair(user.id, now)
    }

    pub fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<String> {
        self.tokens.refresh(refresh_token, now)
    }

    /// Resolve an access token to the user it was issued for.
    pub async fn authenticate(&self, access_token: &str, now: DateTime<Utc>) -> Result<user::Model> {
        let claims = self.tokens.verify(access_token, TokenKind::Access, now)?;
        user::Entity::find_by_id(claims.id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::unauthenticated("User not found"))
    }

    pub async fn update_profile(
        &self,
        user: user::Model,
        changes: ProfileChanges,
    ) -> Result<UpdatedProfile> {
        let mut replaced_picture = None;
        let current = user.clone();
        let mut active: user::ActiveModel = user.into();

        if let Some(username) = changes.username.filter(|s| !s.trim().is_empty()) {
            if username != current.username && self.find_by_username(&username).await?.is_some() {
                return Err(Error::conflict(USERNAME_TAKEN));
            }
            active.username = Set(username);
        }
        if let Some(email) = changes.email.filter(|s| !s.is_empty()) {
            validate_email(&email)?;
            if email != current.email && self.find_by_email(&email).await?.is_some() {
                return Err(Error::conflict(EMAIL_TAKEN));
            }
            active.email = Set(email);
        }
        if let Some(bio) = changes.bio.filter(|s| !s.is_empty()) {
            active.bio = Set(Some(bio));
        }
        if let Some(picture) = changes.picture.filter(|s| !s.is_empty()) {
            if current.picture.as_deref() != Some(picture.as_str()) {
                replaced_picture = current.picture.clone();
            }
            active.picture = Set(Some(picture));
        }

        let user = active
            .update(self.db)
            .await
            .map_err(|e| Error::on_unique_violation(e, USERNAME_OR_EMAIL_TAKEN))?;

        tracing::info!(user = user.id, "updated profile");
        Ok(UpdatedProfile {
            user,
            replaced_picture,
        })
    }

    pub async fn change_password(&self, user: user::Model, current: &str, new: &str) -> Result<()> {
        if !self.hasher.verify(current, &user.password).await? {
            return Err(Error::unauthenticated(INVALID_PASSWORD));
        }
        validate_password(new)?;

        let id = user.id;
        let mut active: user::ActiveModel = user.into();
        active.password = Set(self.hasher.hash(new).await?);
        active.update(self.db).await?;

        tracing::info!(user = id, "changed password");
        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?)
    }
}
