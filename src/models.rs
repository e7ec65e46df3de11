use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of a content item / 内容发布状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    Draft,
    Published,
    Unlisted,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Draft => "draft",
            VideoStatus::Published => "published",
            VideoStatus::Unlisted => "unlisted",
        }
    }

    /// Parse from database column, unknown values fall back to draft / 从数据库字段解析
    pub fn parse(s: &str) -> Self {
        match s {
            "published" => VideoStatus::Published,
            "unlisted" => VideoStatus::Unlisted,
            _ => VideoStatus::Draft,
        }
    }
}

/// Content item as seen by this service / 内容条目（本服务只读）
///
/// Owned and mutated by the content repository; the search core never writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: VideoStatus,
    /// Moderation approval flag / 审核通过标记
    pub approved: bool,
    pub creator_id: String,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Video {
    /// Only published and approved items are ever indexed or searched / 可索引条件
    pub fn is_eligible(&self) -> bool {
        self.status == VideoStatus::Published && self.approved
    }
}
