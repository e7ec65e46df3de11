use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config;

/// Open the content database pool (WAL mode) / 打开内容数据库连接池
pub async fn connect() -> Result<SqlitePool> {
    let db_url = config::config().get_database_url();

    // 确保数据目录存在
    std::fs::create_dir_all(config::config().get_data_dir()).ok();

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await?;

    // 启用WAL模式，提高并发性能
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;

    // 设置busy_timeout，避免锁超时
    sqlx::query("PRAGMA busy_timeout=5000").execute(&pool).await?;

    // 优化写入性能
    sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;

    tracing::info!("Content database opened: {} (WAL mode)", db_url);

    Ok(pool)
}

/// Run database migrations / 运行数据库迁移
///
/// Only creates tables when missing, never drops existing data.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS creators (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'draft',
            approved INTEGER NOT NULL DEFAULT 0,
            creator_id TEXT NOT NULL,
            views INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            published_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 可索引条目的游标扫描与计数都走这个索引
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_videos_eligible ON videos(status, approved, id)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_videos_published ON videos(published_at)")
        .execute(pool)
        .await?;

    Ok(())
}
