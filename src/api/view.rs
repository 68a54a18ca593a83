//! JSON shapes sent back to clients. Password hashes never leave through here.

use chrono::{DateTime, Utc};
use entity::{tweet, user};
use serde::Serialize;

/// A user as listed among followers and followings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub bio: String,
    pub picture: String,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            bio: user.bio.unwrap_or_default(),
            picture: user.picture.unwrap_or_default(),
        }
    }
}

/// The signed-in user's own profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub email: String,
    pub bio: String,
    pub picture: String,
}

impl From<user::Model> for ProfileView {
    fn from(user: user::Model) -> Self {
        Self {
            username: user.username,
            email: user.email,
            bio: user.bio.unwrap_or_default(),
            picture: user.picture.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TweetView {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub body: String,
    pub file: String,
    pub author_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

impl TweetView {
    pub fn with_likes(mut self, likes: u64) -> Self {
        self.likes = Some(likes);
        self
    }
}

impl From<tweet::Model> for TweetView {
    fn from(tweet: tweet::Model) -> Self {
        Self {
            id: tweet.id,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
            title: tweet.title,
            body: tweet.body,
            file: tweet.file.unwrap_or_default(),
            author_id: tweet.author_id,
            likes: None,
        }
    }
}
