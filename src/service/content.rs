use chrono::{DateTime, Utc};
use entity::tweet;
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Func},
};
use serde::Serialize;

use crate::{Error, Result};

pub const TWEET_NOT_FOUND: &str = "tweet not found";

/// The row shape returned by tweet search.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct TweetSummary {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTweet {
    pub title: String,
    pub body: String,
    /// Upload reference, already written by the caller
    pub file: Option<String>,
}

/// Fields left `None` (or empty) keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TweetChanges {
    pub title: Option<String>,
    pub body: Option<String>,
    pub file: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdatedTweet {
    pub tweet: tweet::Model,
    /// The file reference that was overwritten, now unreferenced
    pub replaced_file: Option<String>,
}

/// Result of looking a tweet up on behalf of a would-be editor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ownership<T> {
    Owned(T),
    /// The tweet exists but belongs to someone else
    NotOwned,
    Missing,
}

impl<T> Ownership<T> {
    /// Both negative outcomes surface as the same `NotFound`, so a caller
    /// cannot tell someone else's tweet from a missing one.
    pub fn into_owned(self) -> Result<T> {
        match self {
            Self::Owned(t) => Ok(t),
            Self::NotOwned | Self::Missing => Err(Error::not_found(TWEET_NOT_FOUND)),
        }
    }
}

#[derive(Debug)]
pub struct Tweets<'a, C> {
    db: &'a C,
}

impl<'a, C> Tweets<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, author_id: i32, new: NewTweet) -> Result<tweet::Model> {
        if new.title.trim().is_empty() {
            return Err(Error::invalid("title is required"));
        }
        if new.body.trim().is_empty() {
            return Err(Error::invalid("body is required"));
        }

        let tweet = tweet::ActiveModel {
            title: Set(new.title),
            body: Set(new.body),
            file: Set(new.file),
            author_id: Set(author_id),
            ..Default::default()
        }
        .insert(self.db)
        .await?;

        tracing::info!(author = author_id, tweet = tweet.id, "created tweet");
        Ok(tweet)
    }

    pub async fn get(&self, id: i32) -> Result<tweet::Model> {
        tweet::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found(TWEET_NOT_FOUND))
    }

    /// All tweets, or those whose title or body contains `query`
    /// (case-insensitive), oldest first.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<TweetSummary>> {
        let mut select = tweet::Entity::find()
            .select_only()
            .columns([
                tweet::Column::Id,
                tweet::Column::Title,
                tweet::Column::Body,
                tweet::Column::CreatedAt,
            ])
            .order_by_asc(tweet::Column::Id);

        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", query.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((tweet::Entity, tweet::Column::Title))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((tweet::Entity, tweet::Column::Body))))
                            .like(pattern),
                    ),
            );
        }

        let tweets = select.into_model::<TweetSummary>().all(self.db).await?;
        tracing::debug!(query, found = tweets.len(), "searched tweets");
        Ok(tweets)
    }

    pub async fn ownership(&self, actor: i32, id: i32) -> Result<Ownership<tweet::Model>> {
        let ownership = match tweet::Entity::find_by_id(id).one(self.db).await? {
            None => Ownership::Missing,
            Some(tweet) if tweet.author_id == actor => Ownership::Owned(tweet),
            Some(_) => Ownership::NotOwned,
        };
        Ok(ownership)
    }

    pub async fn update(&self, actor: i32, id: i32, changes: TweetChanges) -> Result<UpdatedTweet> {
        let tweet = self.ownership(actor, id).await?.into_owned()?;

        let mut replaced_file = None;
        let current_file = tweet.file.clone();
        let mut active: tweet::ActiveModel = tweet.into();

        if let Some(title) = changes.title.filter(|s| !s.trim().is_empty()) {
            active.title = Set(title);
        }
        if let Some(body) = changes.body.filter(|s| !s.trim().is_empty()) {
            active.body = Set(body);
        }
        if let Some(file) = changes.file.filter(|s| !s.is_empty()) {
            if current_file.as_deref() != Some(file.as_str()) {
                replaced_file = current_file;
            }
            active.file = Set(Some(file));
        }

        let tweet = active.update(self.db).await?;
        tracing::info!(author = actor, tweet = tweet.id, "updated tweet");

        Ok(UpdatedTweet {
            tweet,
            replaced_file,
        })
    }

    /// Hard delete; returns the removed row so its file can be cleaned up.
    pub async fn delete(&self, actor: i32, id: i32) -> Result<tweet::Model> {
        let tweet = self.ownership(actor, id).await?.into_owned()?;
        tweet::Entity::delete_by_id(tweet.id).exec(self.db).await?;
        tracing::info!(author = actor, tweet = tweet.id, "deleted tweet");
        Ok(tweet)
    }
}
