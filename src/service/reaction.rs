use chrono::Utc;
use entity::{like, tweet};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use super::{EdgeInsert, TWEET_NOT_FOUND};
use crate::{Error, Result};

pub const ALREADY_LIKED: &str = "tweet already liked";
pub const LIKE_NOT_FOUND: &str = "like not found";

/// Likes: at most one per user and tweet.
#[derive(Debug)]
pub struct Reactions<'a, C> {
    db: &'a C,
}

impl<'a, C> Reactions<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// The tweet must exist (`NotFound`) and not be liked by `actor` yet
    /// (`Conflict`).
    pub async fn like(&self, actor: i32, tweet_id: i32) -> Result<()> {
        let tweet = self.find_tweet(tweet_id).await?;

        if self.has_liked(actor, tweet.id).await? {
            return Err(Error::conflict(ALREADY_LIKED));
        }

        match self.insert_edge(actor, tweet.id).await? {
            EdgeInsert::Inserted => {
                tracing::info!(actor, tweet = tweet.id, "liked tweet");
                Ok(())
            }
            EdgeInsert::AlreadyExists => Err(Error::conflict(ALREADY_LIKED)),
        }
    }

    /// Not idempotent: unliking twice is `NotFound` the second time.
    pub async fn unlike(&self, actor: i32, tweet_id: i32) -> Result<()> {
        let tweet = self.find_tweet(tweet_id).await?;

        let res = like::Entity::delete_many()
            .filter(like::Column::UserId.eq(actor))
            .filter(like::Column::TweetId.eq(tweet.id))
            .exec(self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(Error::not_found(LIKE_NOT_FOUND));
        }
        tracing::info!(actor, tweet = tweet.id, "unliked tweet");
        Ok(())
    }

    pub async fn has_liked(&self, actor: i32, tweet_id: i32) -> Result<bool> {
        let edge = like::Entity::find()
            .filter(like::Column::UserId.eq(actor))
            .filter(like::Column::TweetId.eq(tweet_id))
            .one(self.db)
            .await?;
        Ok(edge.is_some())
    }

    pub async fn like_count(&self, tweet_id: i32) -> Result<u64> {
        let count = like::Entity::find()
            .filter(like::Column::TweetId.eq(tweet_id))
            .count(self.db)
            .await?;
        Ok(count)
    }

    pub async fn insert_edge(&self, user_id: i32, tweet_id: i32) -> Result<EdgeInsert> {
        let edge = like::ActiveModel {
            user_id: Set(user_id),
            tweet_id: Set(tweet_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let res = like::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([like::Column::UserId, like::Column::TweetId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.db)
            .await?;

        Ok(res.into())
    }

    async fn find_tweet(&self, id: i32) -> Result<tweet::Model> {
        tweet::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found(TWEET_NOT_FOUND))
    }
}
