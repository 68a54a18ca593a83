use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_cookies::{
    Cookie, Cookies,
    cookie::{SameSite, time::Duration},
};

use super::{AUTH_COOKIE, AppState, CurrentUser, JsonBody, MultipartForm, ProfileView};
use crate::{
    Result,
    auth::{ACCESS_TOKEN_TTL, TokenPair},
    service::{LoginId, ProfileChanges, SignUp},
    upload::Folder,
};

pub async fn sign_up(State(state): State<AppState>, mut form: MultipartForm) -> Result<Json<Value>> {
    let picture = match form.file("Picture") {
        Some(upload) => Some(state.uploads.save(Folder::ProfilePictures, &upload).await?),
        None => None,
    };

    let result = state
        .accounts()
        .sign_up(SignUp {
            username: form.text("UserName"),
            email: form.text("Email"),
            password: form.text("Password"),
            bio: form.take("Bio"),
            picture: picture.clone(),
        })
        .await;
    let user = state.uploads.settle(picture.as_deref(), result).await?;

    Ok(Json(json!({
        "message": "User created successfully",
        "user": ProfileView::from(user),
    })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "UserName")]
    username: Option<String>,
    #[serde(default, alias = "Email")]
    email: Option<String>,
    #[serde(alias = "Password")]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let id = LoginId::from_parts(req.username, req.email)?;
    let tokens = state.accounts().login(id, &req.password, Utc::now()).await?;
    cookies.add(auth_cookie(tokens.access_token.clone()));
    Ok(Json(tokens))
}

fn auth_cookie(token: String) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(ACCESS_TOKEN_TTL))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RefreshRequest>,
) -> Result<Json<Value>> {
    let access_token = state.accounts().refresh(&req.refresh_token, Utc::now())?;
    Ok(Json(json!({ "access_token": access_token })))
}

pub async fn profile(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "user": ProfileView::from(user) }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    mut form: MultipartForm,
) -> Result<Json<Value>> {
    let picture = match form.file("Picture") {
        Some(upload) => Some(state.uploads.save(Folder::ProfilePictures, &upload).await?),
        None => None,
    };

    let result = state
        .accounts()
        .update_profile(
            user,
            ProfileChanges {
                username: form.take("UserName"),
                email: form.take("Email"),
                bio: form.take("Bio"),
                picture: picture.clone(),
            },
        )
        .await;
    let updated = state.uploads.settle(picture.as_deref(), result).await?;

    if let Some(old) = &updated.replaced_picture {
        state.uploads.discard(old).await;
    }

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": ProfileView::from(updated.user),
    })))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "CurrentPassword")]
    current_password: String,
    #[serde(alias = "NewPassword")]
    new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> Result<Json<Value>> {
    state
        .accounts()
        .change_password(user, &req.current_password, &req.new_password)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
