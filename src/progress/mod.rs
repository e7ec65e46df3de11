//! Rebuild progress tracking / 重建进度跟踪
//!
//! The rebuild coordinator reports through the `ProgressTracker` trait so the
//! observability backend stays swappable. `ProgressManager` is the in-memory
//! implementation with event broadcast; `NoopTracker` is the null object used
//! when nobody is watching.

pub mod manager;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

pub use manager::ProgressManager;
pub use types::{ProgressCounts, ProgressEvent, ProgressStatus, RebuildProgress};

/// Progress tracker contract / 进度跟踪契约
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    /// Register a new rebuild with its total item count / 注册一次重建
    async fn create(&self, progress_id: &str, total_items: u64) -> Result<()>;

    /// Mark the rebuild as running / 标记为运行中
    async fn start(&self, progress_id: &str) -> Result<()>;

    /// Push incremental counters (only honored while running) / 推送增量计数
    async fn update(&self, progress_id: &str, counts: ProgressCounts) -> Result<()>;

    /// Finalize with an optional error message / 结束（可带错误信息）
    async fn complete(&self, progress_id: &str, error: Option<String>) -> Result<()>;
}

/// Null tracker, substituted when no tracker is supplied / 空跟踪器
pub struct NoopTracker;

#[async_trait]
impl ProgressTracker for NoopTracker {
    async fn create(&self, _progress_id: &str, _total_items: u64) -> Result<()> {
        Ok(())
    }

    async fn start(&self, _progress_id: &str) -> Result<()> {
        Ok(())
    }

    async fn update(&self, _progress_id: &str, _counts: ProgressCounts) -> Result<()> {
        Ok(())
    }

    async fn complete(&self, _progress_id: &str, _error: Option<String>) -> Result<()> {
        Ok(())
    }
}
