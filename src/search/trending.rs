//! Trending search terms / 热门搜索词
//!
//! Samples the recent, popular slice of the corpus and weights every
//! extracted term by ln(views + 1) per containing item, so one viral video
//! cannot drown out everything else. Soft feature: failures degrade to an
//! empty list, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};

use super::terms::extract_search_terms;
use crate::config;
use crate::repo::VideoRepository;

/// Default number of returned terms / 默认返回词数
pub const DEFAULT_TRENDING_LIMIT: usize = 10;

/// Popularity-weighted trending term aggregator / 按热度加权的热门词聚合器
pub struct TrendingAggregator {
    repo: Arc<dyn VideoRepository>,
    window_days: i64,
    min_views: i64,
    sample_size: usize,
}

impl TrendingAggregator {
    pub fn new(repo: Arc<dyn VideoRepository>) -> Self {
        let search = config::config().search;
        Self {
            repo,
            window_days: search.trending_window_days,
            min_views: search.trending_min_views,
            sample_size: search.trending_sample_size,
        }
    }

    /// Top trending terms, weight descending / 按权重降序的热门词
    pub async fn trending_terms(&self, limit: usize) -> Vec<String> {
        match self.collect(limit).await {
            Ok(terms) => terms,
            Err(e) => {
                tracing::error!("Failed to compute trending search terms: {}", e);
                Vec::new()
            }
        }
    }

    async fn collect(&self, limit: usize) -> Result<Vec<String>> {
        let since = Utc::now() - Duration::days(self.window_days);
        let sample = self
            .repo
            .recent_popular(since, self.min_views, self.sample_size)
            .await?;

        let mut weights: HashMap<String, f64> = HashMap::new();
        for video in &sample {
            let weight = (video.views as f64 + 1.0).ln();
            for term in extract_search_terms(&video.title, video.description.as_deref()) {
                *weights.entry(term).or_default() += weight;
            }
        }

        let mut ranked: Vec<(String, f64)> = weights.into_iter().collect();
        // 权重相同按词典序，保证结果稳定
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);
        Ok(ranked.into_iter().map(|(term, _)| term).collect())
    }
}
