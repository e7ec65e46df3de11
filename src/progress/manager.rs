use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{broadcast, RwLock};

use super::types::{ProgressCounts, ProgressEvent, ProgressStatus, RebuildProgress};
use super::ProgressTracker;

/// In-memory progress manager with event broadcast / 内存进度管理器（支持事件广播）
///
/// One record per progress id. Subscribers (studio UI, admin console) receive
/// every transition over the broadcast channel.
#[derive(Clone)]
pub struct ProgressManager {
    entries: Arc<RwLock<HashMap<String, RebuildProgress>>>,
    event_sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressManager {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(256);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            event_sender,
        }
    }

    /// Subscribe to progress events / 订阅进度事件
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.event_sender.subscribe()
    }

    fn broadcast(&self, event: ProgressEvent) {
        let _ = self.event_sender.send(event);
    }

    /// Current state of one rebuild / 查询单次重建的当前状态
    pub async fn get(&self, progress_id: &str) -> Option<RebuildProgress> {
        let entries = self.entries.read().await;
        entries.get(progress_id).cloned()
    }

    /// All known rebuilds / 所有已知的重建记录
    pub async fn all(&self) -> Vec<RebuildProgress> {
        let entries = self.entries.read().await;
        entries.values().cloned().collect()
    }

    /// Drop finished records / 清理已结束的记录
    pub async fn clear_finished(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, p| {
            matches!(p.status, ProgressStatus::Created | ProgressStatus::Running)
        });
        before - entries.len()
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressTracker for ProgressManager {
    async fn create(&self, progress_id: &str, total_items: u64) -> Result<()> {
        let progress = RebuildProgress::new(progress_id.to_string(), total_items);
        let mut entries = self.entries.write().await;
        entries.insert(progress_id.to_string(), progress.clone());
        drop(entries);
        tracing::info!("Rebuild progress created: {} (total: {})", progress_id, total_items);
        self.broadcast(ProgressEvent::Created { progress });
        Ok(())
    }

    async fn start(&self, progress_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(progress) = entries.get_mut(progress_id) {
            progress.status = ProgressStatus::Running;
            progress.started_at = Some(Utc::now());
            let progress = progress.clone();
            drop(entries);
            self.broadcast(ProgressEvent::Updated { progress });
        }
        Ok(())
    }

    async fn update(&self, progress_id: &str, counts: ProgressCounts) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(progress) = entries.get_mut(progress_id) {
            // 只在运行中接受增量更新
            if progress.status != ProgressStatus::Running {
                tracing::warn!(
                    "Ignoring progress update for {} in status {:?}",
                    progress_id,
                    progress.status
                );
                return Ok(());
            }
            // processed ≤ total，succeeded + failed ≤ processed
            progress.processed_items = counts.processed_items.min(progress.total_items);
            let reported = counts.successful_items + counts.failed_items;
            if reported > progress.processed_items {
                tracing::warn!(
                    "Progress counters exceed processed for {}: {} > {}",
                    progress_id,
                    reported,
                    progress.processed_items
                );
            }
            progress.successful_items = counts.successful_items;
            progress.failed_items = counts.failed_items;
            let progress = progress.clone();
            drop(entries);
            self.broadcast(ProgressEvent::Updated { progress });
        }
        Ok(())
    }

    async fn complete(&self, progress_id: &str, error: Option<String>) -> Result<()> {
        let mut entries = self.entries.write().await;
        if let Some(progress) = entries.get_mut(progress_id) {
            progress.finished_at = Some(Utc::now());
            progress.status = if error.is_some() {
                ProgressStatus::Failed
            } else {
                ProgressStatus::Completed
            };
            progress.error = error;
            let progress = progress.clone();
            drop(entries);
            match progress.status {
                ProgressStatus::Failed => {
                    tracing::warn!(
                        "Rebuild progress failed: {} ({:?})",
                        progress_id,
                        progress.error
                    );
                    self.broadcast(ProgressEvent::Failed { progress });
                }
                _ => {
                    tracing::info!("Rebuild progress completed: {}", progress_id);
                    self.broadcast(ProgressEvent::Completed { progress });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_success() {
        let manager = ProgressManager::new();
        manager.create("p1", 25).await.unwrap();
        assert_eq!(manager.get("p1").await.unwrap().status, ProgressStatus::Created);

        manager.start("p1").await.unwrap();
        manager
            .update(
                "p1",
                ProgressCounts { processed_items: 10, successful_items: 9, failed_items: 1 },
            )
            .await
            .unwrap();
        let progress = manager.get("p1").await.unwrap();
        assert_eq!(progress.status, ProgressStatus::Running);
        assert_eq!(progress.processed_items, 10);

        manager.complete("p1", None).await.unwrap();
        assert_eq!(manager.get("p1").await.unwrap().status, ProgressStatus::Completed);
    }

    #[tokio::test]
    async fn test_updates_ignored_outside_running() {
        let manager = ProgressManager::new();
        manager.create("p1", 5).await.unwrap();

        // created 状态下的更新被忽略
        manager
            .update(
                "p1",
                ProgressCounts { processed_items: 3, successful_items: 3, failed_items: 0 },
            )
            .await
            .unwrap();
        assert_eq!(manager.get("p1").await.unwrap().processed_items, 0);
    }

    #[tokio::test]
    async fn test_processed_clamped_to_total() {
        let manager = ProgressManager::new();
        manager.create("p1", 5).await.unwrap();
        manager.start("p1").await.unwrap();
        manager
            .update(
                "p1",
                ProgressCounts { processed_items: 12, successful_items: 5, failed_items: 0 },
            )
            .await
            .unwrap();
        assert_eq!(manager.get("p1").await.unwrap().processed_items, 5);
    }

    #[tokio::test]
    async fn test_error_completion() {
        let manager = ProgressManager::new();
        manager.create("p1", 5).await.unwrap();
        manager.start("p1").await.unwrap();
        manager.complete("p1", Some("count query failed".to_string())).await.unwrap();

        let progress = manager.get("p1").await.unwrap();
        assert_eq!(progress.status, ProgressStatus::Failed);
        assert_eq!(progress.error.as_deref(), Some("count query failed"));
    }

    #[tokio::test]
    async fn test_event_broadcast() {
        let manager = ProgressManager::new();
        let mut rx = manager.subscribe();
        manager.create("p1", 1).await.unwrap();
        match rx.recv().await.unwrap() {
            ProgressEvent::Created { progress } => assert_eq!(progress.id, "p1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
