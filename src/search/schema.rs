//! Search schema definition / 搜索 Schema 定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived searchable record for one content item / 单个内容的派生索引记录
///
/// Ephemeral: recomputed on demand, never persisted by this core. Exists only
/// for eligible items (published and approved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDocument {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    /// Deduplicated searchable tokens / 去重后的搜索词
    pub search_terms: Vec<String>,
    /// Hashtag tags from the description / 描述中的话题标签
    pub tags: Vec<String>,
    /// Single inferred category, if any / 推断出的单个分类
    pub category: Option<String>,
    pub creator_name: Option<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Ranking strategy / 排序策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Relevance,
    Views,
    Date,
}

/// Search query options / 搜索查询选项
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Search keywords / 搜索关键词
    pub query: String,
    /// Maximum number of results to return / 最大返回结果数
    pub limit: usize,
    /// Offset (for pagination) / 偏移量
    pub offset: usize,
    /// Optional category post-filter / 可选的分类过滤
    pub category: Option<String>,
    pub sort: SortMode,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 20,
            offset: 0,
            category: None,
            sort: SortMode::Relevance,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }
}

/// Search response / 搜索响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub videos: Vec<VideoDocument>,
    /// Exact match count, independent of pagination / 不受分页影响的匹配总数
    pub total: usize,
    /// Up to 6 generated query suggestions / 最多6条查询建议
    pub suggestions: Vec<String>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self { videos: Vec::new(), total: 0, suggestions: Vec::new() }
    }
}
