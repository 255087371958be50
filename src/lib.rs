//! Finance Assistant - a small financial-literacy web service
//!
//! Serves a learning catalog of video modules backed by SQLite, and a finance
//! news feed fetched from NewsAPI through a single server-held credential.
//! The same credential backs a CORS-enabled JSON proxy endpoint.

pub mod config;
pub mod db;
pub mod news;
pub mod routes;
pub mod view;
