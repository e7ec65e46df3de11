//! Index record builder / 索引记录构建器
//!
//! Derives the searchable representation for a single content item. The
//! eligibility gate (exists, published, approved) runs before any text
//! processing; callers outside the rebuild loop never see an error from here.

use std::sync::Arc;

use anyhow::Result;

use super::category::infer_category;
use super::schema::VideoDocument;
use super::terms::{extract_search_terms, extract_tags};
use crate::models::Video;
use crate::repo::VideoRepository;

/// Compose a derived record from a fetched item / 由已取回的条目组装派生记录
pub(crate) fn compose_document(video: &Video, creator_name: Option<String>) -> VideoDocument {
    let description = video.description.as_deref();
    VideoDocument {
        id: video.id.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        search_terms: extract_search_terms(&video.title, description),
        tags: extract_tags(description),
        category: infer_category(&video.title, description).map(String::from),
        creator_name,
        views: video.views,
        created_at: video.created_at,
        published_at: video.published_at,
    }
}

/// Builds index records on demand / 按需构建索引记录
pub struct Indexer {
    repo: Arc<dyn VideoRepository>,
}

impl Indexer {
    pub fn new(repo: Arc<dyn VideoRepository>) -> Self {
        Self { repo }
    }

    /// Fallible variant used by the rebuild loop so per-item failures can be
    /// counted / 重建循环使用的可失败版本
    pub(crate) async fn try_index(&self, id: &str) -> Result<Option<VideoDocument>> {
        let Some(video) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };
        if !video.is_eligible() {
            return Ok(None);
        }
        let creator_name = self.repo.creator_name(&video.creator_id).await?;
        Ok(Some(compose_document(&video, creator_name)))
    }

    /// Build the index record for one item / 构建单个条目的索引记录
    ///
    /// Returns `None` for missing or ineligible items; unexpected fetch
    /// failures are logged and also mapped to `None`.
    pub async fn index_video(&self, id: &str) -> Option<VideoDocument> {
        match self.try_index(id).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("Failed to index video {}: {}", id, e);
                None
            }
        }
    }
}
