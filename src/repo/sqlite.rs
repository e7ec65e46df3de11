//! SQLite content repository / SQLite 内容仓库
//!
//! LIKE queries + index acceleration over the platform's content tables.
//! Timestamps are stored as RFC3339 text; eligible scans go through
//! idx_videos_eligible so cursor pages stay cheap at any position.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::VideoRepository;
use crate::models::{Video, VideoStatus};

const ELIGIBLE: &str = "status = 'published' AND approved = 1";

/// SQLite-backed repository / SQLite 仓库实现
pub struct SqliteVideoRepository {
    db: SqlitePool,
}

impl SqliteVideoRepository {
    /// Use an existing database pool / 使用现有数据库连接池
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Open the configured content database and run migrations / 按配置打开内容数据库
    pub async fn from_config() -> Result<Self> {
        let pool = crate::db::connect().await?;
        crate::db::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Seed helper for tests and fixtures; production writes go through the
    /// platform's write path / 测试用写入辅助
    pub async fn insert_video(&self, video: &Video) -> Result<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO videos
               (id, title, description, status, approved, creator_id, views, created_at, published_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.status.as_str())
        .bind(if video.approved { 1 } else { 0 })
        .bind(&video.creator_id)
        .bind(video.views)
        .bind(video.created_at.to_rfc3339())
        .bind(video.published_at.map(|t| t.to_rfc3339()))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Seed helper for tests and fixtures / 测试用写入辅助
    pub async fn insert_creator(&self, id: &str, display_name: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO creators (id, display_name, created_at) VALUES (?, ?, ?)",
        )
        .bind(id)
        .bind(display_name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

fn video_from_row(row: &SqliteRow) -> Video {
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let published_at: Option<String> = row.get("published_at");

    Video {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        status: VideoStatus::parse(&status),
        approved: row.get::<i64, _>("approved") == 1,
        creator_id: row.get("creator_id"),
        views: row.get("views"),
        created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        published_at: published_at
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// One `(title OR description)` containment group per term / 每个词一组 LIKE 条件
fn term_clause(count: usize, joiner: &str) -> String {
    std::iter::repeat(
        "(lower(title) LIKE ? ESCAPE '\\' OR lower(coalesce(description, '')) LIKE ? ESCAPE '\\')",
    )
    .take(count)
    .collect::<Vec<_>>()
    .join(joiner)
}

/// Escape LIKE wildcards so query text matches literally / 转义 LIKE 通配符
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl VideoRepository for SqliteVideoRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Video>> {
        let row = sqlx::query("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| video_from_row(&r)))
    }

    async fn creator_name(&self, creator_id: &str) -> Result<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT display_name FROM creators WHERE id = ?")
                .bind(creator_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(name)
    }

    async fn count_eligible(&self) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM videos WHERE {}", ELIGIBLE))
                .fetch_one(&self.db)
                .await?;
        Ok(count as u64)
    }

    async fn eligible_page_after(&self, cursor: Option<&str>, limit: usize) -> Result<Vec<Video>> {
        let rows = match cursor {
            Some(cursor) => {
                sqlx::query(&format!(
                    "SELECT * FROM videos WHERE {} AND id > ? ORDER BY id ASC LIMIT ?",
                    ELIGIBLE
                ))
                .bind(cursor)
                .bind(limit as i64)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT * FROM videos WHERE {} ORDER BY id ASC LIMIT ?",
                    ELIGIBLE
                ))
                .bind(limit as i64)
                .fetch_all(&self.db)
                .await?
            }
        };
        Ok(rows.iter().map(video_from_row).collect())
    }

    async fn find_matching_all_terms(&self, terms: &[String]) -> Result<Vec<Video>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM videos WHERE {} AND ({})",
            ELIGIBLE,
            term_clause(terms.len(), " AND ")
        );
        let mut query = sqlx::query(&sql);
        for term in terms {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.bind(pattern.clone()).bind(pattern);
        }
        let rows = query.fetch_all(&self.db).await?;
        Ok(rows.iter().map(video_from_row).collect())
    }

    async fn find_matching_any_term(&self, terms: &[String]) -> Result<Vec<Video>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM videos WHERE {} AND ({})",
            ELIGIBLE,
            term_clause(terms.len(), " OR ")
        );
        let mut query = sqlx::query(&sql);
        for term in terms {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            query = query.bind(pattern.clone()).bind(pattern);
        }
        let rows = query.fetch_all(&self.db).await?;
        Ok(rows.iter().map(video_from_row).collect())
    }

    async fn find_substring(&self, needle: &str) -> Result<Vec<Video>> {
        let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
        let rows = sqlx::query(&format!(
            "SELECT * FROM videos WHERE {} AND (lower(title) LIKE ? ESCAPE '\\' OR lower(coalesce(description, '')) LIKE ? ESCAPE '\\')",
            ELIGIBLE
        ))
        .bind(pattern.clone())
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.iter().map(video_from_row).collect())
    }

    async fn recent_popular(
        &self,
        since: DateTime<Utc>,
        min_views: i64,
        limit: usize,
    ) -> Result<Vec<Video>> {
        // RFC3339 UTC 字符串可直接按字典序比较
        let rows = sqlx::query(&format!(
            "SELECT * FROM videos WHERE {} AND published_at >= ? AND views >= ? ORDER BY views DESC LIMIT ?",
            ELIGIBLE
        ))
        .bind(since.to_rfc3339())
        .bind(min_views)
        .bind(limit as i64)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.iter().map(video_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_repo() -> (SqliteVideoRepository, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("content.db");
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect(&format!("sqlite:{}?mode=rwc", db_path.to_string_lossy()))
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        (SqliteVideoRepository::new(pool), dir)
    }

    fn video(id: &str, title: &str, description: Option<&str>, views: i64) -> Video {
        Video {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(|d| d.to_string()),
            status: VideoStatus::Published,
            approved: true,
            creator_id: "c1".to_string(),
            views,
            created_at: Utc::now(),
            published_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_eligible_count_and_cursor_page() {
        let (repo, _dir) = test_repo().await;
        for id in ["v01", "v02", "v03"] {
            repo.insert_video(&video(id, "clip", None, 0)).await.unwrap();
        }
        let mut unlisted = video("v04", "clip", None, 0);
        unlisted.status = VideoStatus::Unlisted;
        repo.insert_video(&unlisted).await.unwrap();

        assert_eq!(repo.count_eligible().await.unwrap(), 3);

        let page = repo.eligible_page_after(Some("v01"), 10).await.unwrap();
        let ids: Vec<&str> = page.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["v02", "v03"]);
    }

    #[tokio::test]
    async fn test_term_matching_modes() {
        let (repo, _dir) = test_repo().await;
        repo.insert_video(&video("v1", "Rust Tutorial", Some("learn rust fast"), 5))
            .await
            .unwrap();
        repo.insert_video(&video("v2", "Cooking Show", Some("pasta recipe"), 9))
            .await
            .unwrap();

        let both = vec!["rust".to_string(), "learn".to_string()];
        assert_eq!(repo.find_matching_all_terms(&both).await.unwrap().len(), 1);

        let either = vec!["rust".to_string(), "pasta".to_string()];
        assert_eq!(repo.find_matching_any_term(&either).await.unwrap().len(), 2);

        let hits = repo.find_substring("COOKING").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "v2");
    }

    #[tokio::test]
    async fn test_like_wildcards_match_literally() {
        let (repo, _dir) = test_repo().await;
        repo.insert_video(&video("v1", "sale 10x off", None, 5)).await.unwrap();
        repo.insert_video(&video("v2", "sale 10% off", None, 5)).await.unwrap();

        // % 不能当通配符用
        let hits = repo.find_substring("10% off").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "v2");

        let terms = vec!["10%".to_string()];
        let hits = repo.find_matching_any_term(&terms).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "v2");

        // 下划线同样按字面匹配
        assert!(repo.find_substring("10_ off").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_popular_filters_and_orders() {
        let (repo, _dir) = test_repo().await;
        let mut old = video("v1", "old hit", None, 9000);
        old.published_at = Some(Utc::now() - Duration::days(60));
        repo.insert_video(&old).await.unwrap();
        repo.insert_video(&video("v2", "new hit", None, 500)).await.unwrap();
        repo.insert_video(&video("v3", "new bigger hit", None, 800))
            .await
            .unwrap();
        repo.insert_video(&video("v4", "quiet", None, 10)).await.unwrap();

        let since = Utc::now() - Duration::days(30);
        let sample = repo.recent_popular(since, 100, 100).await.unwrap();
        let ids: Vec<&str> = sample.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["v3", "v2"]);
    }

    #[tokio::test]
    async fn test_creator_lookup() {
        let (repo, _dir) = test_repo().await;
        repo.insert_creator("c1", "Ada").await.unwrap();
        assert_eq!(repo.creator_name("c1").await.unwrap().as_deref(), Some("Ada"));
        assert_eq!(repo.creator_name("missing").await.unwrap(), None);
    }
}
