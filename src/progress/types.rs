use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rebuild progress status / 重建进度状态
///
/// created → running → completed | failed. Incremental updates are only
/// accepted while running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Created,
    Running,
    Completed,
    Failed,
}

/// Incremental counters pushed by the rebuild loop / 重建循环推送的增量计数
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressCounts {
    pub processed_items: u64,
    pub successful_items: u64,
    pub failed_items: u64,
}

/// One rebuild invocation's progress record / 单次重建的进度记录
///
/// Never reused across invocations; a new id is minted per rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildProgress {
    pub id: String,
    pub status: ProgressStatus,
    pub total_items: u64,
    pub processed_items: u64,
    pub successful_items: u64,
    pub failed_items: u64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RebuildProgress {
    pub fn new(id: String, total_items: u64) -> Self {
        Self {
            id,
            status: ProgressStatus::Created,
            total_items,
            processed_items: 0,
            successful_items: 0,
            failed_items: 0,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Progress event (pushed to subscribers) / 进度事件（推送给订阅者）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Created { progress: RebuildProgress },
    Updated { progress: RebuildProgress },
    Completed { progress: RebuildProgress },
    Failed { progress: RebuildProgress },
}
