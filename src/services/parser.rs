//! Extraction of movie titles from free-text model output.

use regex::Regex;
use std::sync::OnceLock;

static TITLE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Matches "Title (YYYY)" with or without bold markup. The bold alternative
/// comes first so an emphasis-wrapped occurrence is captured without its
/// asterisks. Titles that themselves contain parentheses before the year
/// marker are not recognized specially and may split badly; the heuristic is
/// kept as-is for parity with how responses are actually formatted.
fn title_pattern() -> &'static Regex {
    TITLE_PATTERN.get_or_init(|| {
        Regex::new(r"\*\*([^*]+)\s\((\d{4})\)\*\*|([^*\n]+)\s\((\d{4})\)").unwrap()
    })
}

/// Extracts candidate movie titles from a model response, in order of first
/// occurrence. Duplicates are preserved; the parenthesized year is dropped.
/// Text without any "Title (YYYY)" occurrence yields an empty list.
pub fn extract_movie_titles(text: &str) -> Vec<String> {
    title_pattern()
        .captures_iter(text)
        .filter_map(|captures| captures.get(1).or_else(|| captures.get(3)))
        .map(|title| title.as_str().trim().to_string())
        .collect()
}
