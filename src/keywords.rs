//! # Keyword Extractor
//!
//! Turns a headline into at most a few salient keywords used for topic
//! matching. Pure and deterministic.
//!
//! 1. `#topic#` markers win: their contents, in order, are the whole result.
//! 2. Otherwise anything that is not a CJK ideograph or ASCII alphanumeric
//!    becomes a separator; tokens shorter than 2 chars and stop words are
//!    dropped; the first `MAX_KEYWORDS` survivors are returned.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

pub const MAX_KEYWORDS: usize = 3;
pub const MIN_TOKEN_CHARS: usize = 2;
/// Display label length when a title yields no keywords.
pub const FALLBACK_LABEL_CHARS: usize = 20;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([^#]+)#").expect("hashtag regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "的", "了", "在", "是", "我", "有", "和", "就", "不", "人", "都", "一", "一个", "上", "也",
        "很", "到", "说", "要", "去", "你", "会", "着", "没有", "看", "好", "自己", "这", "与", "及",
        "等", "或",
    ]
    .into_iter()
    .collect()
});

/// CJK Unified Ideographs block as matched by the tokenizer (U+4E00..=U+9FA5).
#[inline]
pub(crate) fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FA5}').contains(&c)
}

#[inline]
pub(crate) fn is_keyword_char(c: char) -> bool {
    is_cjk(c) || c.is_ascii_alphanumeric()
}

/// Contents of every `#...#` pair, left to right.
pub fn extract_hashtags(title: &str) -> Vec<String> {
    HASHTAG
        .captures_iter(title)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

pub fn extract_keywords(title: &str) -> Vec<String> {
    let tags = extract_hashtags(title);
    if !tags.is_empty() {
        return tags;
    }

    let spaced: String = title
        .chars()
        .map(|c| if is_keyword_char(c) { c } else { ' ' })
        .collect();

    spaced
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !is_stop_word(w))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// First keyword, or the leading chars of the title when there is none.
pub fn label_for(keywords: &[String], title: &str) -> String {
    keywords
        .first()
        .cloned()
        .unwrap_or_else(|| title.chars().take(FALLBACK_LABEL_CHARS).collect())
}
