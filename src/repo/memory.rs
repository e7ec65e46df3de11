//! In-memory content repository / 内存内容仓库
//!
//! Backs tests and embedded deployments. Matching semantics mirror the SQLite
//! implementation (case-insensitive containment on title/description).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::VideoRepository;
use crate::models::Video;

/// In-memory corpus keyed by video id / 以视频ID为键的内存语料
#[derive(Clone, Default)]
pub struct MemoryVideoRepository {
    videos: Arc<RwLock<BTreeMap<String, Video>>>,
    creators: Arc<RwLock<BTreeMap<String, String>>>,
    /// Ids whose lookup fails, for failure-isolation tests / 注入查询失败的ID
    fail_ids: Arc<RwLock<HashSet<String>>>,
}

impl MemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_video(&self, video: Video) {
        self.videos.write().await.insert(video.id.clone(), video);
    }

    pub async fn insert_creator(&self, id: &str, display_name: &str) {
        self.creators
            .write()
            .await
            .insert(id.to_string(), display_name.to_string());
    }

    /// Make `find_by_id` fail for this id / 让指定ID的查询失败
    pub async fn fail_on(&self, id: &str) {
        self.fail_ids.write().await.insert(id.to_string());
    }

    async fn eligible(&self) -> Vec<Video> {
        self.videos
            .read()
            .await
            .values()
            .filter(|v| v.is_eligible())
            .cloned()
            .collect()
    }
}

fn haystack(video: &Video) -> String {
    let description = video.description.as_deref().unwrap_or("");
    format!("{} {}", video.title, description).to_lowercase()
}

#[async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Video>> {
        if self.fail_ids.read().await.contains(id) {
            return Err(anyhow!("injected failure for video {}", id));
        }
        Ok(self.videos.read().await.get(id).cloned())
    }

    async fn creator_name(&self, creator_id: &str) -> Result<Option<String>> {
        Ok(self.creators.read().await.get(creator_id).cloned())
    }

    async fn count_eligible(&self) -> Result<u64> {
        Ok(self.eligible().await.len() as u64)
    }

    async fn eligible_page_after(&self, cursor: Option<&str>, limit: usize) -> Result<Vec<Video>> {
        // BTreeMap iteration is already id-ascending / BTreeMap 本身按ID升序
        let mut page = self.eligible().await;
        if let Some(cursor) = cursor {
            page.retain(|v| v.id.as_str() > cursor);
        }
        page.truncate(limit);
        Ok(page)
    }

    async fn find_matching_all_terms(&self, terms: &[String]) -> Result<Vec<Video>> {
        let mut hits = self.eligible().await;
        hits.retain(|v| {
            let text = haystack(v);
            terms.iter().all(|t| text.contains(t.as_str()))
        });
        Ok(hits)
    }

    async fn find_matching_any_term(&self, terms: &[String]) -> Result<Vec<Video>> {
        let mut hits = self.eligible().await;
        hits.retain(|v| {
            let text = haystack(v);
            terms.iter().any(|t| text.contains(t.as_str()))
        });
        Ok(hits)
    }

    async fn find_substring(&self, needle: &str) -> Result<Vec<Video>> {
        let needle = needle.to_lowercase();
        let mut hits = self.eligible().await;
        hits.retain(|v| haystack(v).contains(&needle));
        Ok(hits)
    }

    async fn recent_popular(
        &self,
        since: DateTime<Utc>,
        min_views: i64,
        limit: usize,
    ) -> Result<Vec<Video>> {
        let mut hits = self.eligible().await;
        hits.retain(|v| v.views >= min_views && v.published_at.map(|p| p >= since).unwrap_or(false));
        hits.sort_by(|a, b| b.views.cmp(&a.views));
        hits.truncate(limit);
        Ok(hits)
    }
}
