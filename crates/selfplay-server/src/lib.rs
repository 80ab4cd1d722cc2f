//! Selfplay coordinator library
//!
//! HTTP coordinator for distributed self-play training. Workers ask it for
//! work, download networks, and report back training games and match
//! results.
//!
//! # Architecture
//!
//! The server follows a **CQRS** layout: every operation is a command (writes)
//! or a query (reads) inside a feature slice under [`features`], with its own
//! error enum and an Axum route that maps that enum onto HTTP statuses.
//!
//! - [`db`]: SQLite [`db::Store`] with embedded migrations
//! - [`storage`]: network and training-data blobs (local directory or S3)
//! - [`api`]: router assembly and response envelopes
//! - [`config`]: environment-based configuration
//!
//! # Example
//!
//! ```no_run
//! use selfplay_server::{api, config::Config, db::Store, features::FeatureState, storage};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = Store::open(&config.database).await?;
//!     let blobs = storage::from_config(&storage::StorageConfig::from_env()?).await?;
//!     let state = FeatureState::new(store.pool().clone(), blobs, config.dispatch);
//!     let app = api::create_router(state, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod storage;

pub use error::AppError;
