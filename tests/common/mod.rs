#![allow(dead_code)]

use chirp::{
    auth::{PasswordHasher, TokenIssuer},
    service::{Accounts, Reactions, SocialGraph, Tweets},
};
use entity::{tweet, user};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub const SECRET: &[u8] = b"test-secret";
pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

/// A fresh in-memory database with the schema applied.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
}

impl TestContext {
    pub async fn new() -> Self {
        let db = connect().await;
        Self {
            db,
            tokens: TokenIssuer::new(SECRET),
            hasher: PasswordHasher::new(4),
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

    /// Insert a user row directly, skipping validation and hashing.
    pub async fn user(&self, username: &str) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_owned()),
            email: Set(format!("{username}@example.com")),
            password: Set("not-a-hash".to_owned()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }

    pub async fn tweet(&self, author: &user::Model, title: &str, body: &str) -> tweet::Model {
        tweet::ActiveModel {
            title: Set(title.to_owned()),
            body: Set(body.to_owned()),
            author_id: Set(author.id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }
}

pub async fn connect() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}
