use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use super::{AppState, CurrentUser, PathId, UserView};
use crate::Result;

pub async fn follow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(target): PathId,
) -> Result<Json<Value>> {
    state.graph().follow(user.id, target).await?;
    Ok(Json(json!({ "message": "User followed successfully" })))
}

pub async fn unfollow(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(target): PathId,
) -> Result<StatusCode> {
    state.graph().unfollow(user.id, target).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn followers(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let users = state.graph().followers(user.id).await?;
    let followers: Vec<UserView> = users.into_iter().map(UserView::from).collect();
    Ok(Json(json!({ "followers": followers })))
}

pub async fn followings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    let users = state.graph().followings(user.id).await?;
    let followings: Vec<UserView> = users.into_iter().map(UserView::from).collect();
    Ok(Json(json!({ "followings": followings })))
}

pub async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(tweet): PathId,
) -> Result<Json<Value>> {
    state.reactions().like(user.id, tweet).await?;
    Ok(Json(json!({ "message": "Tweet liked successfully" })))
}

pub async fn unlike(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(tweet): PathId,
) -> Result<Json<Value>> {
    state.reactions().unlike(user.id, tweet).await?;
    Ok(Json(json!({ "message": "Tweet unliked successfully" })))
}
