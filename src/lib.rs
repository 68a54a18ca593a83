#![deny(missing_debug_implementations)]

//! # chirp
//!
//! A small social-networking backend: accounts with JWT sessions, tweets
//! with optional attachments, a follow graph and likes, served over HTTP.
//!
//! The crate is layered the usual way:
//!
//! - [`service`]: domain operations over an injected SeaORM connection
//! - [`auth`]: credential rules, password hashing and token issuing
//! - [`upload`]: attachment storage on local disk
//! - [`api`]: the axum router that exposes all of the above
//!
//! ```no_run
//! use chirp::{AppState, Config};
//! use sea_orm::Database;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let db = Database::connect(config.database_url.as_str()).await?;
//! let app = chirp::router(AppState::new(db, &config));
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
mod error;
pub mod service;
pub mod upload;

pub use api::{AppState, router};
pub use config::Config;
pub use error::{Error, Result};
