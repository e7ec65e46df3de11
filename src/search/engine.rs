//! Query engine / 查询引擎
//!
//! Two ranking strategies behind `SortMode`:
//! - relevance: lexical match quality (title above description) plus a
//!   logarithmic popularity boost
//! - views/date: AND-match on extracted terms with a substring fallback,
//!   ordered by the requested field
//!
//! The optional category filter runs over the already-paginated page, so a
//! filtered page may come back shorter than `limit` even when later pages
//! still hold matches. That is inherited behavior, kept on purpose.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use super::indexer::compose_document;
use super::schema::{SearchOptions, SearchResponse, SortMode, VideoDocument};
use super::terms::extract_search_terms;
use crate::models::Video;
use crate::repo::VideoRepository;

/// Per-term title hit weight / 标题命中权重
const TITLE_WEIGHT: f32 = 3.0;
/// Per-term description hit weight / 描述命中权重
const DESCRIPTION_WEIGHT: f32 = 1.0;
/// Popularity boost factor over ln(views + 1) / 热度加成系数
const POPULARITY_FACTOR: f32 = 0.3;

/// Suggestion templates, applied in order / 建议模板（按序应用）
const SUGGESTION_TEMPLATES: [&str; 4] = ["{} tutorial", "how to {}", "{} guide", "best {}"];
const MAX_SUGGESTIONS: usize = 6;

/// Read-only search engine over the content repository / 只读搜索引擎
pub struct SearchEngine {
    repo: Arc<dyn VideoRepository>,
}

impl SearchEngine {
    pub fn new(repo: Arc<dyn VideoRepository>) -> Self {
        Self { repo }
    }

    /// Run a search / 执行搜索
    ///
    /// Blank queries short-circuit to an empty response without touching the
    /// repository. Repository failures are logged and re-raised.
    pub async fn search(&self, options: &SearchOptions) -> Result<SearchResponse> {
        let query = options.query.trim();
        if query.is_empty() {
            return Ok(SearchResponse::empty());
        }

        let terms = extract_search_terms(query, None);

        let result = match options.sort {
            SortMode::Relevance => self.search_relevance(options, query, &terms).await,
            SortMode::Views | SortMode::Date => {
                self.search_sorted(options, query, &terms).await
            }
        };

        let (mut videos, total) = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Search failed for query {:?}: {}", query, e);
                return Err(e);
            }
        };

        // 分类过滤在分页之后执行（沿用既有行为）
        if let Some(category) = &options.category {
            videos.retain(|doc| doc.category.as_deref() == Some(category.as_str()));
        }

        let suggestions = build_suggestions(query, &terms);
        Ok(SearchResponse { videos, total, suggestions })
    }

    /// Relevance mode: combined lexical + popularity score / 相关性模式
    async fn search_relevance(
        &self,
        options: &SearchOptions,
        query: &str,
        terms: &[String],
    ) -> Result<(Vec<VideoDocument>, usize)> {
        let candidates = if terms.is_empty() {
            self.repo.find_substring(query).await?
        } else {
            self.repo.find_matching_any_term(terms).await?
        };

        let mut scored: Vec<(f32, Video)> = candidates
            .into_iter()
            .map(|v| (relevance_score(&v, terms), v))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.1.views.cmp(&a.1.views))
        });

        let total = scored.len();
        let page: Vec<Video> = scored
            .into_iter()
            .map(|(_, v)| v)
            .skip(options.offset)
            .take(options.limit)
            .collect();
        Ok((self.build_documents(page).await?, total))
    }

    /// Views/date mode: AND-terms with substring fallback / 播放量与日期模式
    async fn search_sorted(
        &self,
        options: &SearchOptions,
        query: &str,
        terms: &[String],
    ) -> Result<(Vec<VideoDocument>, usize)> {
        let mut matches = if terms.is_empty() {
            // 查询词全被过滤时退化为子串匹配
            self.repo.find_substring(query).await?
        } else {
            self.repo.find_matching_all_terms(terms).await?
        };

        match options.sort {
            SortMode::Views => matches.sort_by(|a, b| b.views.cmp(&a.views)),
            // relevance 在 search 里走独立路径，这里列出只为穷举
            SortMode::Date | SortMode::Relevance => matches.sort_by(|a, b| {
                let a_key = a.published_at.unwrap_or(a.created_at);
                let b_key = b.published_at.unwrap_or(b.created_at);
                b_key.cmp(&a_key)
            }),
        }

        let total = matches.len();
        let page: Vec<Video> = matches
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .collect();
        Ok((self.build_documents(page).await?, total))
    }

    async fn build_documents(&self, page: Vec<Video>) -> Result<Vec<VideoDocument>> {
        let mut docs = Vec::with_capacity(page.len());
        for video in page {
            let creator_name = self.repo.creator_name(&video.creator_id).await?;
            docs.push(compose_document(&video, creator_name));
        }
        Ok(docs)
    }
}

fn relevance_score(video: &Video, terms: &[String]) -> f32 {
    let title = video.title.to_lowercase();
    let description = video.description.as_deref().unwrap_or("").to_lowercase();

    let mut score = 0.0f32;
    for term in terms {
        if title.contains(term.as_str()) {
            score += TITLE_WEIGHT;
        }
        if description.contains(term.as_str()) {
            score += DESCRIPTION_WEIGHT;
        }
    }
    score + POPULARITY_FACTOR * (video.views as f32 + 1.0).ln()
}

/// Generate query suggestions / 生成查询建议
///
/// Templates are applied to the original query and each extracted term longer
/// than 3 characters, capped at 6 suggestions.
fn build_suggestions(query: &str, terms: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = vec![query.to_lowercase()];
    let mut seen: HashSet<String> = candidates.iter().cloned().collect();
    for term in terms {
        if seen.insert(term.clone()) {
            candidates.push(term.clone());
        }
    }

    let mut suggestions = Vec::new();
    for candidate in candidates {
        if candidate.chars().count() <= 3 {
            continue;
        }
        for template in SUGGESTION_TEMPLATES {
            suggestions.push(template.replace("{}", &candidate));
            if suggestions.len() == MAX_SUGGESTIONS {
                return suggestions;
            }
        }
    }
    suggestions
}
