//! Term and tag extraction / 搜索词与标签提取
//!
//! Pure text normalization: the same pipeline feeds indexing, querying and
//! trending, so index-time and query-time tokens always agree.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Fixed English stop-word list / 固定英文停用词表
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "this", "that", "these", "those", "it", "its",
        "as", "from", "has", "have", "had", "will", "would", "can", "could",
    ]
    .into_iter()
    .collect()
});

/// Hashtag pattern / 话题标签模式
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").unwrap());

/// Extract deduplicated search terms from title + description / 提取去重后的搜索词
///
/// Lowercases, replaces non-word characters with spaces, drops stop words and
/// single-character tokens, keeps first-seen order. Never fails; a missing
/// description is treated as empty.
pub fn extract_search_terms(title: &str, description: Option<&str>) -> Vec<String> {
    let combined = format!("{} {}", title, description.unwrap_or(""));
    let normalized: String = combined
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut terms = Vec::new();
    for token in normalized.split_whitespace() {
        if token.chars().count() < 2 {
            continue;
        }
        if STOP_WORDS.contains(token) {
            continue;
        }
        if seen.insert(token) {
            terms.push(token.to_string());
        }
    }
    terms
}

/// Extract hashtag-style tags from a description / 从描述中提取话题标签
///
/// Returns lowercased tags without the leading `#`, in match order.
pub fn extract_tags(description: Option<&str>) -> Vec<String> {
    let Some(description) = description else {
        return Vec::new();
    };
    TAG_PATTERN
        .captures_iter(description)
        .map(|cap| cap[1].to_lowercase())
        .collect()
}
