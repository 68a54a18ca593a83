use chrono::Utc;
use entity::{follow, user};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Set, sea_query::OnConflict,
};

use super::EdgeInsert;
use crate::{Error, Result};

pub const USER_NOT_FOUND: &str = "user not found";
pub const ALREADY_FOLLOWING: &str = "already following this user";
pub const CANNOT_FOLLOW_YOURSELF: &str = "cannot follow yourself";
pub const NOT_FOLLOWING: &str = "not following this user";

/// The follow relation between users.
///
/// An edge `(followed_by_id = X, following_id = Y)` always means "X follows
/// Y"; [`follow`](Self::follow) and [`unfollow`](Self::unfollow) both address
/// the edge `actor -> target`.
#[derive(Debug)]
pub struct SocialGraph<'a, C> {
    db: &'a C,
}

impl<'a, C> SocialGraph<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Make `actor` follow `target`.
    ///
    /// Checks run in a fixed order: the target exists (`NotFound`), the edge
    /// is not already there (`Conflict`), the actor is not the target
    /// (`InvalidArgument`). The insert itself is conflict-safe, so a
    /// concurrent duplicate that slips past the lookup is still a `Conflict`.
    pub async fn follow(&self, actor: i32, target: i32) -> Result<()> {
        let target = self.find_user(target).await?;

        if self.is_following(actor, target.id).await? {
            return Err(Error::conflict(ALREADY_FOLLOWING));
        }

        if actor == target.id {
            return Err(Error::invalid(CANNOT_FOLLOW_YOURSELF));
        }

        match self.insert_edge(actor, target.id).await? {
            EdgeInsert::Inserted => {
                tracing::info!(actor, target = target.id, "followed user");
                Ok(())
            }
            EdgeInsert::AlreadyExists => Err(Error::conflict(ALREADY_FOLLOWING)),
        }
    }

    /// Remove the edge `actor -> target`. Not idempotent: a missing edge is
    /// `NotFound`.
    pub async fn unfollow(&self, actor: i32, target: i32) -> Result<()> {
        let target = self.find_user(target).await?;

        let res = follow::Entity::delete_many()
            .filter(follow::Column::FollowedById.eq(actor))
            .filter(follow::Column::FollowingId.eq(target.id))
            .exec(self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(Error::not_found(NOT_FOLLOWING));
        }
        tracing::info!(actor, target = target.id, "unfollowed user");
        Ok(())
    }

    /// Users following `user_id`, in the order they followed.
    pub async fn followers(&self, user_id: i32) -> Result<Vec<user::Model>> {
        let users = user::Entity::find()
            .join_rev(JoinType::InnerJoin, follow::Relation::FollowedBy.def())
            .filter(follow::Column::FollowingId.eq(user_id))
            .order_by_asc(follow::Column::Id)
            .all(self.db)
            .await?;
        Ok(users)
    }

    /// Users `user_id` follows, in the order they were followed.
    pub async fn followings(&self, user_id: i32) -> Result<Vec<user::Model>> {
        let users = user::Entity::find()
            .join_rev(JoinType::InnerJoin, follow::Relation::Following.def())
            .filter(follow::Column::FollowedById.eq(user_id))
            .order_by_asc(follow::Column::Id)
            .all(self.db)
            .await?;
        Ok(users)
    }

    pub async fn is_following(&self, actor: i32, target: i32) -> Result<bool> {
        let edge = follow::Entity::find()
            .filter(follow::Column::FollowedById.eq(actor))
            .filter(follow::Column::FollowingId.eq(target))
            .one(self.db)
            .await?;
        Ok(edge.is_some())
    }

    /// Insert the edge unless the unique index already holds it.
    pub async fn insert_edge(&self, followed_by: i32, following: i32) -> Result<EdgeInsert> {
        let edge = follow::ActiveModel {
            followed_by_id: Set(followed_by),
            following_id: Set(following),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let res = follow::Entity::insert(edge)
            .on_conflict(
                OnConflict::columns([follow::Column::FollowedById, follow::Column::FollowingId])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.db)
            .await?;

        Ok(res.into())
    }

    async fn find_user(&self, id: i32) -> Result<user::Model> {
        user::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }
}
