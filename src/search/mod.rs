//! Search module - content indexing and search service / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - Text processing (terms, tags, categories) is pure and synchronous
//! - All store access goes through the `VideoRepository` trait (unidirectional)
//! - Index records are derived on demand, never persisted here
//!
//! Components / 组成：
//! - `terms` / `category`: deterministic text normalization and classification
//! - `indexer`: eligibility-gated index record builder
//! - `rebuild`: batched, rate-limited full rebuild with progress reporting
//! - `engine`: relevance and views/date ranking with query suggestions
//! - `trending`: popularity-weighted trending terms

pub mod category;
pub mod engine;
pub mod indexer;
pub mod rebuild;
pub mod schema;
pub mod terms;
pub mod trending;

use std::sync::Arc;

use anyhow::Result;

use crate::progress::{NoopTracker, ProgressTracker};
use crate::repo::VideoRepository;

pub use engine::SearchEngine;
pub use indexer::Indexer;
pub use rebuild::{RebuildCoordinator, RebuildError, RebuildOptions, RebuildOutcome};
pub use schema::{SearchOptions, SearchResponse, SortMode, VideoDocument};
pub use trending::{TrendingAggregator, DEFAULT_TRENDING_LIMIT};

/// Facade over the search components / 搜索组件的统一门面
///
/// Route handlers construct one of these per process and call the four public
/// operations; everything else in this module is wiring.
pub struct SearchService {
    indexer: Indexer,
    coordinator: RebuildCoordinator,
    engine: SearchEngine,
    trending: TrendingAggregator,
}

impl SearchService {
    /// Service without progress observation / 不带进度观察的服务
    pub fn new(repo: Arc<dyn VideoRepository>) -> Self {
        Self::with_tracker(repo, Arc::new(NoopTracker))
    }

    pub fn with_tracker(repo: Arc<dyn VideoRepository>, tracker: Arc<dyn ProgressTracker>) -> Self {
        Self {
            indexer: Indexer::new(repo.clone()),
            coordinator: RebuildCoordinator::new(repo.clone(), tracker),
            engine: SearchEngine::new(repo.clone()),
            trending: TrendingAggregator::new(repo),
        }
    }

    /// Build the index record for one item / 构建单个条目的索引记录
    pub async fn index_video(&self, id: &str) -> Option<VideoDocument> {
        self.indexer.index_video(id).await
    }

    /// Rebuild the whole search index / 重建整个搜索索引
    pub async fn rebuild_search_index(
        &self,
        options: RebuildOptions,
    ) -> Result<RebuildOutcome, RebuildError> {
        self.coordinator.rebuild(options).await
    }

    /// Ranked search with suggestions / 带建议的排序搜索
    pub async fn search_videos(&self, options: &SearchOptions) -> Result<SearchResponse> {
        self.engine.search(options).await
    }

    /// Trending terms, default limit 10 / 热门搜索词
    pub async fn trending_search_terms(&self, limit: Option<usize>) -> Vec<String> {
        self.trending
            .trending_terms(limit.unwrap_or(DEFAULT_TRENDING_LIMIT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Video, VideoStatus};
    use crate::progress::{ProgressManager, ProgressStatus};
    use crate::repo::MemoryVideoRepository;
    use chrono::Utc;

    fn video(id: &str, title: &str, views: i64) -> Video {
        Video {
            id: id.to_string(),
            title: title.to_string(),
            description: Some(format!("{} description #clip", title)),
            status: VideoStatus::Published,
            approved: true,
            creator_id: "c1".to_string(),
            views,
            created_at: Utc::now(),
            published_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_service_end_to_end() {
        let repo = Arc::new(MemoryVideoRepository::new());
        repo.insert_creator("c1", "Ada").await;
        repo.insert_video(video("v1", "Rust tutorial", 500)).await;
        repo.insert_video(video("v2", "Gameplay night", 900)).await;

        let tracker = Arc::new(ProgressManager::new());
        let service = SearchService::with_tracker(repo, tracker.clone());

        let doc = service.index_video("v1").await.unwrap();
        assert_eq!(doc.tags, vec!["clip".to_string()]);

        let outcome = service
            .rebuild_search_index(RebuildOptions { batch_delay_ms: 0, ..Default::default() })
            .await
            .unwrap();
        assert_eq!(outcome.total_processed, 2);
        let progress = tracker.get(&outcome.progress_id).await.unwrap();
        assert_eq!(progress.status, ProgressStatus::Completed);

        let response = service
            .search_videos(&SearchOptions::new("rust"))
            .await
            .unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.videos[0].id, "v1");

        let trending = service.trending_search_terms(None).await;
        assert!(trending.contains(&"gameplay".to_string()));
    }
}
