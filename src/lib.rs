//! ClipHub search backend library / ClipHub 搜索后端库
//!
//! Content indexing and search for a video platform: derives searchable
//! records from the content store, serves ranked queries with suggestions,
//! and aggregates trending terms. Persistence is SQLite via sqlx; the
//! `SearchService` facade in [`search`] is the public entry point.

pub mod config;
pub mod db;
pub mod models;
pub mod progress;
pub mod repo;
pub mod search;

pub use search::SearchService;
