//! Full index rebuild coordinator / 全量索引重建协调器
//!
//! Walks the whole eligible corpus in cursor-based batches, building every
//! index record sequentially with per-item failure isolation, throttled by an
//! inter-batch delay so the backing store is never saturated. Progress goes
//! to a `ProgressTracker`; the state machine per invocation is
//! created → running → completed(success | error).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::indexer::Indexer;
use crate::config;
use crate::progress::{ProgressCounts, ProgressTracker};
use crate::repo::VideoRepository;

/// Tracker update cadence (items) / 进度推送间隔（条）
const UPDATE_EVERY: u64 = 10;
/// Milestone log cadence (percent) / 里程碑日志间隔（百分比）
const MILESTONE_STEP: u64 = 10;

/// Rebuild configuration / 重建配置
#[derive(Debug, Clone)]
pub struct RebuildOptions {
    /// Items per batch / 每批条数
    pub batch_size: usize,
    /// Delay between batches (deliberate backpressure) / 批次间延迟
    pub batch_delay_ms: u64,
    /// Progress id; auto-generated when absent / 进度ID（缺省自动生成）
    pub progress_id: Option<String>,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self { batch_size: 10, batch_delay_ms: 100, progress_id: None }
    }
}

impl RebuildOptions {
    /// Read batch knobs from the global config / 从全局配置读取批次参数
    pub fn from_config() -> Self {
        let search = config::config().search;
        Self {
            batch_size: search.batch_size,
            batch_delay_ms: search.batch_delay_ms,
            progress_id: None,
        }
    }
}

/// Summary of one rebuild run / 单次重建的汇总结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildOutcome {
    pub indexed: u64,
    pub errors: u64,
    pub total_processed: u64,
    pub progress_id: String,
}

/// Operation-level rebuild failure, carrying how far the run got / 重建级失败
#[derive(Debug, Error)]
#[error("search index rebuild failed after {processed} items: {source}")]
pub struct RebuildError {
    pub processed: u64,
    #[source]
    pub source: anyhow::Error,
}

/// Drives full-corpus rebuilds / 驱动全量重建
pub struct RebuildCoordinator {
    repo: Arc<dyn VideoRepository>,
    indexer: Indexer,
    tracker: Arc<dyn ProgressTracker>,
}

impl RebuildCoordinator {
    pub fn new(repo: Arc<dyn VideoRepository>, tracker: Arc<dyn ProgressTracker>) -> Self {
        let indexer = Indexer::new(repo.clone());
        Self { repo, indexer, tracker }
    }

    /// Rebuild the entire search index / 重建整个搜索索引
    ///
    /// Per-item failures are counted and never abort the run. Operation-level
    /// failures (count or batch queries) finalize the tracker with an error
    /// and surface as `RebuildError` with the processed count.
    pub async fn rebuild(&self, options: RebuildOptions) -> Result<RebuildOutcome, RebuildError> {
        let progress_id = options
            .progress_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut indexed = 0u64;
        let mut errors = 0u64;
        let mut total_processed = 0u64;

        tracing::info!(
            "Search index rebuild started: {} (batch_size: {}, delay: {}ms)",
            progress_id,
            options.batch_size,
            options.batch_delay_ms
        );

        match self
            .run(&progress_id, &options, &mut indexed, &mut errors, &mut total_processed)
            .await
        {
            Ok(()) => {
                self.push_update(&progress_id, total_processed, indexed, errors).await;
                if let Err(e) = self.tracker.complete(&progress_id, None).await {
                    tracing::warn!("Progress completion failed for {}: {}", progress_id, e);
                }
                tracing::info!(
                    "Search index rebuild finished: {} (indexed: {}, errors: {})",
                    progress_id,
                    indexed,
                    errors
                );
                Ok(RebuildOutcome { indexed, errors, total_processed, progress_id })
            }
            Err(source) => {
                tracing::error!("Search index rebuild failed: {} ({})", progress_id, source);
                if let Err(e) = self
                    .tracker
                    .complete(&progress_id, Some(source.to_string()))
                    .await
                {
                    tracing::warn!("Progress completion failed for {}: {}", progress_id, e);
                }
                Err(RebuildError { processed: total_processed, source })
            }
        }
    }

    async fn run(
        &self,
        progress_id: &str,
        options: &RebuildOptions,
        indexed: &mut u64,
        errors: &mut u64,
        total_processed: &mut u64,
    ) -> anyhow::Result<()> {
        // 先统计总数，不物化完整ID列表
        let total = self.repo.count_eligible().await?;

        if let Err(e) = self.tracker.create(progress_id, total).await {
            tracing::warn!("Progress create failed for {}: {}", progress_id, e);
        }
        if let Err(e) = self.tracker.start(progress_id).await {
            tracing::warn!("Progress start failed for {}: {}", progress_id, e);
        }

        let mut cursor: Option<String> = None;
        let mut last_milestone = 0u64;

        loop {
            let batch = self
                .repo
                .eligible_page_after(cursor.as_deref(), options.batch_size)
                .await?;
            if batch.is_empty() {
                break;
            }
            let batch_len = batch.len();

            // 批内严格串行处理
            for video in &batch {
                match self.indexer.try_index(&video.id).await {
                    Ok(Some(_doc)) => *indexed += 1,
                    Ok(None) => {
                        *errors += 1;
                        tracing::warn!(
                            "Video {} no longer indexable during rebuild",
                            video.id
                        );
                    }
                    Err(e) => {
                        *errors += 1;
                        tracing::error!("Failed to index video {} during rebuild: {}", video.id, e);
                    }
                }
                *total_processed += 1;

                if *total_processed % UPDATE_EVERY == 0 {
                    self.push_update(progress_id, *total_processed, *indexed, *errors).await;
                }

                if total > 0 {
                    let percent = *total_processed * 100 / total;
                    while percent >= last_milestone + MILESTONE_STEP {
                        last_milestone += MILESTONE_STEP;
                        tracing::info!(
                            "Search index rebuild {}%: {}/{} items",
                            last_milestone,
                            total_processed,
                            total
                        );
                    }
                }
            }

            cursor = batch.last().map(|v| v.id.clone());
            if batch_len < options.batch_size {
                break;
            }
            // 批次间让路，给写入方留带宽
            tokio::time::sleep(Duration::from_millis(options.batch_delay_ms)).await;
        }

        Ok(())
    }

    async fn push_update(&self, progress_id: &str, processed: u64, indexed: u64, errors: u64) {
        let counts = ProgressCounts {
            processed_items: processed,
            successful_items: indexed,
            failed_items: errors,
        };
        if let Err(e) = self.tracker.update(progress_id, counts).await {
            tracing::warn!("Progress update failed for {}: {}", progress_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Video, VideoStatus};
    use crate::progress::{NoopTracker, ProgressCounts, ProgressManager, ProgressStatus};
    use crate::repo::{MemoryVideoRepository, VideoRepository};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Capture rebuild logs in test output / 在测试输出中捕获重建日志
    fn init_tracing() -> tracing::subscriber::DefaultGuard {
        tracing_subscriber::fmt()
            .with_env_filter("cliphub_search=debug")
            .with_test_writer()
            .set_default()
    }

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: format!("Clip {}", id),
            description: None,
            status: VideoStatus::Published,
            approved: true,
            creator_id: "c1".to_string(),
            views: 1,
            created_at: Utc::now(),
            published_at: Some(Utc::now()),
        }
    }

    async fn corpus(count: usize) -> MemoryVideoRepository {
        let repo = MemoryVideoRepository::new();
        repo.insert_creator("c1", "Ada").await;
        for i in 1..=count {
            repo.insert_video(video(&format!("v{:03}", i))).await;
        }
        repo
    }

    fn quick_options() -> RebuildOptions {
        RebuildOptions { batch_size: 10, batch_delay_ms: 0, progress_id: None }
    }

    #[tokio::test]
    async fn test_full_rebuild_counts() {
        let _guard = init_tracing();
        let repo = corpus(25).await;
        let tracker = Arc::new(ProgressManager::new());
        let coordinator = RebuildCoordinator::new(Arc::new(repo), tracker.clone());

        let outcome = coordinator.rebuild(quick_options()).await.unwrap();
        assert_eq!(outcome.total_processed, 25);
        assert_eq!(outcome.indexed + outcome.errors, 25);
        assert_eq!(outcome.errors, 0);

        let progress = tracker.get(&outcome.progress_id).await.unwrap();
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.total_items, 25);
        assert_eq!(progress.processed_items, 25);
        assert_eq!(progress.successful_items, 25);
    }

    #[tokio::test]
    async fn test_per_item_failure_does_not_stop_rebuild() {
        let repo = corpus(25).await;
        // 第13条注入失败
        repo.fail_on("v013").await;
        let tracker = Arc::new(ProgressManager::new());
        let coordinator = RebuildCoordinator::new(Arc::new(repo), tracker.clone());

        let outcome = coordinator.rebuild(quick_options()).await.unwrap();
        assert_eq!(outcome.total_processed, 25);
        assert_eq!(outcome.indexed, 24);
        assert_eq!(outcome.errors, 1);

        let progress = tracker.get(&outcome.progress_id).await.unwrap();
        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.failed_items, 1);
    }

    /// Tracker that records every pushed processed count / 记录每次推送计数的跟踪器
    #[derive(Default)]
    struct RecordingTracker {
        updates: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl ProgressTracker for RecordingTracker {
        async fn create(&self, _progress_id: &str, _total_items: u64) -> Result<()> {
            Ok(())
        }
        async fn start(&self, _progress_id: &str) -> Result<()> {
            Ok(())
        }
        async fn update(&self, _progress_id: &str, counts: ProgressCounts) -> Result<()> {
            self.updates.lock().unwrap().push(counts.processed_items);
            Ok(())
        }
        async fn complete(&self, _progress_id: &str, _error: Option<String>) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_updates_pushed_every_ten_items() {
        let repo = corpus(25).await;
        let tracker = Arc::new(RecordingTracker::default());
        let coordinator = RebuildCoordinator::new(Arc::new(repo), tracker.clone());
        coordinator.rebuild(quick_options()).await.unwrap();

        // 每处理10条推送一次，循环结束后再推送最终计数，而不是逐条推送
        let updates = tracker.updates.lock().unwrap().clone();
        assert_eq!(updates, vec![10, 20, 25]);
    }

    #[tokio::test]
    async fn test_supplied_progress_id_is_kept() {
        let repo = corpus(3).await;
        let coordinator = RebuildCoordinator::new(Arc::new(repo), Arc::new(NoopTracker));
        let options = RebuildOptions {
            progress_id: Some("rebuild-2024".to_string()),
            ..quick_options()
        };
        let outcome = coordinator.rebuild(options).await.unwrap();
        assert_eq!(outcome.progress_id, "rebuild-2024");
    }

    #[tokio::test]
    async fn test_ineligible_items_are_not_visited() {
        let repo = corpus(5).await;
        let mut draft = video("v900");
        draft.status = VideoStatus::Draft;
        repo.insert_video(draft).await;

        let coordinator = RebuildCoordinator::new(Arc::new(repo), Arc::new(NoopTracker));
        let outcome = coordinator.rebuild(quick_options()).await.unwrap();
        assert_eq!(outcome.total_processed, 5);
    }

    /// Repository whose count query always fails / 计数查询总是失败的仓库
    struct BrokenRepo;

    #[async_trait]
    impl VideoRepository for BrokenRepo {
        async fn find_by_id(&self, _id: &str) -> Result<Option<Video>> {
            Ok(None)
        }
        async fn creator_name(&self, _creator_id: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn count_eligible(&self) -> Result<u64> {
            Err(anyhow!("connection reset"))
        }
        async fn eligible_page_after(&self, _cursor: Option<&str>, _limit: usize) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }
        async fn find_matching_all_terms(&self, _terms: &[String]) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }
        async fn find_matching_any_term(&self, _terms: &[String]) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }
        async fn find_substring(&self, _needle: &str) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }
        async fn recent_popular(
            &self,
            _since: DateTime<Utc>,
            _min_views: i64,
            _limit: usize,
        ) -> Result<Vec<Video>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_operation_failure_reports_processed_count() {
        let tracker = Arc::new(ProgressManager::new());
        let coordinator = RebuildCoordinator::new(Arc::new(BrokenRepo), tracker.clone());
        let options = RebuildOptions {
            progress_id: Some("broken".to_string()),
            ..quick_options()
        };

        let err = coordinator.rebuild(options).await.unwrap_err();
        assert_eq!(err.processed, 0);
        assert!(err.to_string().contains("after 0 items"));
        // 计数失败发生在 create 之前，跟踪器里没有记录
        assert!(tracker.get("broken").await.is_none());
    }
}
