//! Category classifier / 分类器
//!
//! Scores a fixed keyword taxonomy against the combined title/description
//! text and picks the single best category. The taxonomy order is part of the
//! observable behavior: equal scores resolve to the earliest declaration, so
//! the table below must stay ordered and the scan must never go through an
//! unordered map.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed taxonomy, ordered / 固定分类表（有序）
///
/// Single-word keywords match on word boundaries (a two-letter acronym like
/// "ai" must not fire inside "maintain"); multi-word phrases use containment.
const TAXONOMY: &[(&str, &[&str])] = &[
    ("gaming", &["gaming", "gameplay", "playthrough", "speedrun", "esports", "fps", "rpg", "minecraft", "boss fight"]),
    ("music", &["music", "song", "album", "remix", "concert", "acoustic", "lyrics", "official video"]),
    ("education", &["tutorial", "course", "lesson", "learn", "explained", "guide", "lecture", "how to", "step by step"]),
    ("technology", &["programming", "coding", "software", "tech", "ai", "ml", "machine learning", "javascript", "rust", "hardware"]),
    ("fitness", &["workout", "fitness", "yoga", "cardio", "gym", "exercise", "weight training"]),
    ("cooking", &["recipe", "cooking", "baking", "kitchen", "chef", "meal prep"]),
    ("travel", &["travel", "trip", "tour", "destination", "itinerary", "backpacking", "road trip"]),
    ("comedy", &["funny", "comedy", "prank", "sketch", "meme", "hilarious", "stand up"]),
    ("news", &["news", "breaking", "headlines", "report", "politics"]),
    ("science", &["science", "physics", "chemistry", "biology", "experiment", "space", "astronomy"]),
];

enum Matcher {
    /// Multi-word phrase, plain containment / 多词短语，子串匹配
    Phrase(&'static str),
    /// Single word, word-boundary match / 单词，词边界匹配
    Word(Regex),
}

impl Matcher {
    fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Phrase(phrase) => text.contains(phrase),
            Matcher::Word(re) => re.is_match(text),
        }
    }
}

struct CategoryMatchers {
    name: &'static str,
    matchers: Vec<Matcher>,
}

/// Compiled once at startup / 启动时编译一次
static MATCHERS: Lazy<Vec<CategoryMatchers>> = Lazy::new(|| {
    TAXONOMY
        .iter()
        .map(|(name, keywords)| CategoryMatchers {
            name,
            matchers: keywords
                .iter()
                .map(|kw| {
                    if kw.contains(' ') {
                        Matcher::Phrase(kw)
                    } else {
                        let re = Regex::new(&format!(r"\b{}\b", regex::escape(kw)))
                            .expect("static keyword pattern");
                        Matcher::Word(re)
                    }
                })
                .collect(),
        })
        .collect()
});

/// Infer the single best category for a content item / 推断内容的最佳分类
///
/// Counts matching keywords per category over the lowercased combined text;
/// the strictly highest count wins, ties go to the category declared first in
/// the taxonomy. Returns `None` when nothing matches.
pub fn infer_category(title: &str, description: Option<&str>) -> Option<&'static str> {
    let text = format!("{} {}", title, description.unwrap_or("")).to_lowercase();

    let mut best: Option<(&'static str, usize)> = None;
    for category in MATCHERS.iter() {
        let score = category.matchers.iter().filter(|m| m.is_match(&text)).count();
        if score == 0 {
            continue;
        }
        match best {
            // 同分保留先声明的分类
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((category.name, score)),
        }
    }
    best.map(|(name, _)| name)
}
