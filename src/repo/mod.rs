//! Content repository contract / 内容仓库契约
//!
//! The content store is owned by the platform's write path; this core only
//! reads it through the narrow trait below. Two implementations are provided:
//! - `SqliteVideoRepository`: LIKE queries + index acceleration (production)
//! - `MemoryVideoRepository`: in-memory corpus for tests and embedding

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::Video;

pub use memory::MemoryVideoRepository;
pub use sqlite::SqliteVideoRepository;

/// Read-only lookup surface of the content store / 内容存储的只读查询面
///
/// "Eligible" everywhere means status = published AND approved = true.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    /// Lookup a single item by id / 按ID查询单个条目
    async fn find_by_id(&self, id: &str) -> Result<Option<Video>>;

    /// Display name of a creator / 创作者显示名称
    async fn creator_name(&self, creator_id: &str) -> Result<Option<String>>;

    /// Count eligible items without materializing ids / 统计可索引条目数
    async fn count_eligible(&self) -> Result<u64>;

    /// One page of eligible items ordered by id ascending, strictly after the
    /// cursor id when present / 按ID升序取一页，跳过游标本身
    async fn eligible_page_after(&self, cursor: Option<&str>, limit: usize) -> Result<Vec<Video>>;

    /// Eligible items whose title or description contains every term
    /// (case-insensitive AND match) / 所有词均命中
    async fn find_matching_all_terms(&self, terms: &[String]) -> Result<Vec<Video>>;

    /// Eligible items whose title or description contains at least one term
    /// (relevance candidates) / 任一词命中（相关性候选集）
    async fn find_matching_any_term(&self, terms: &[String]) -> Result<Vec<Video>>;

    /// Eligible items matching a case-insensitive substring on title or
    /// description / 标题或描述子串匹配
    async fn find_substring(&self, needle: &str) -> Result<Vec<Video>>;

    /// Eligible items published on or after `since` with at least `min_views`
    /// views, ordered by views descending / 近期热门采样
    async fn recent_popular(
        &self,
        since: DateTime<Utc>,
        min_views: i64,
        limit: usize,
    ) -> Result<Vec<Video>>;
}
