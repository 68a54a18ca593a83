use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AppState, CurrentUser, MultipartForm, PathId, TweetView};
use crate::{
    Result,
    service::{NewTweet, TweetChanges},
    upload::Folder,
};

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: MultipartForm,
) -> Result<Json<Value>> {
    let file = match form.file("file") {
        Some(upload) => Some(state.uploads.save(Folder::Tweets, &upload).await?),
        None => None,
    };

    let result = state
        .tweets()
        .create(
            user.id,
            NewTweet {
                title: form.text("title"),
                body: form.text("body"),
                file: file.clone(),
            },
        )
        .await;
    let tweet = state.uploads.settle(file.as_deref(), result).await?;

    Ok(Json(json!({ "tweet": TweetView::from(tweet) })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>> {
    let tweets = state.tweets().search(params.search.as_deref()).await?;
    Ok(Json(json!({ "tweets": tweets })))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _user: CurrentUser,
    PathId(id): PathId,
) -> Result<Json<Value>> {
    let tweet = state.tweets().get(id).await?;
    let likes = state.reactions().like_count(tweet.id).await?;
    Ok(Json(json!({ "tweet": TweetView::from(tweet).with_likes(likes) })))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId,
    mut form: MultipartForm,
) -> Result<Json<Value>> {
    let file = match form.file("file") {
        Some(upload) => Some(state.uploads.save(Folder::Tweets, &upload).await?),
        None => None,
    };

    let changes = TweetChanges {
        title: form.take("title"),
        body: form.take("body"),
        file: file.clone(),
    };
    let result = state.tweets().update(user.id, id, changes).await;
    let updated = state.uploads.settle(file.as_deref(), result).await?;

    if let Some(old) = &updated.replaced_file {
        state.uploads.discard(old).await;
    }

    Ok(Json(json!({
        "message": "Tweet updated successfully",
        "tweet": TweetView::from(updated.tweet),
    })))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    PathId(id): PathId,
) -> Result<StatusCode> {
    let tweet = state.tweets().delete(user.id, id).await?;
    if let Some(file) = &tweet.file {
        state.uploads.discard(file).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
