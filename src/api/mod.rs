//! The HTTP surface: routing, identity extraction and JSON shaping.

mod account;
mod error;
mod extract;
mod form;
mod social;
mod tweet;
mod view;

pub use extract::{AUTH_COOKIE, CurrentUser, JsonBody, PathId};
pub use form::MultipartForm;
pub use view::{ProfileView, TweetView, UserView};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    Config,
    auth::{PasswordHasher, TokenIssuer},
    service::{Accounts, Reactions, SocialGraph, Tweets},
    upload::UploadStore,
};

/// Request bodies above this size are refused.
pub const MAX_BODY_BYTES: usize = 30 << 20;

/// Everything a handler needs, built once at startup.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenIssuer>,
    pub hasher: PasswordHasher,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenIssuer::new(config.secret.as_bytes())),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            uploads: UploadStore::new(config.upload_dir.clone()),
        }
    }

    pub fn accounts(&self) -> Accounts<'_, DatabaseConnection> {
        Accounts::new(&self.db, self.hasher, &self.tokens)
    }

    pub fn graph(&self) -> SocialGraph<'_, DatabaseConnection> {
        SocialGraph::new(&self.db)
    }

    pub fn reactions(&self) -> Reactions<'_, DatabaseConnection> {
        Reactions::new(&self.db)
    }

    pub fn tweets(&self) -> Tweets<'_, DatabaseConnection> {
        Tweets::new(&self.db)
    }
}

pub fn router(state: AppState) -> Router {
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(state.uploads.root()))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(ping))
        .route("/signup", post(account::sign_up))
        .route("/login", post(account::login))
        .route("/refresh", post(account::refresh))
        .route(
            "/user",
            get(account::profile)
                .patch(account::update_profile)
                .post(account::update_profile),
        )
        .route("/change-password", post(account::change_password))
        .route("/create-tweet", post(tweet::create))
        .route("/tweet", get(tweet::list))
        .route(
            "/tweet/{id}",
            get(tweet::retrieve)
                .patch(tweet::update)
                .delete(tweet::remove),
        )
        .route("/tweet/{id}/like", post(social::like))
        .route("/tweet/{id}/unlike", delete(social::unlike))
        .route("/follow/{id}", post(social::follow))
        .route("/unfollow/{id}", post(social::unfollow))
        .route("/followers", get(social::followers))
        .route("/followings", get(social::followings))
        .merge(uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping(_user: CurrentUser) -> Json<Value> {
    Json(json!({ "message": "Access granted to protected route" }))
}

async fn require_auth(_user: CurrentUser, request: Request, next: Next) -> Response {
    next.run(request).await
}
