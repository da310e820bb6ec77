use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "untitled";
pub const DEFAULT_DESCRIPTION: &str = "no description";
pub const DEFAULT_PUBLISHED_AT: &str = "no date";
pub const PLACEHOLDER_THUMBNAIL_URL: &str = "https://via.placeholder.com/150";

/// One feed item, built once per fetch and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub title: String,
    pub description: String,
    /// Raw `pubDate` text; parsed only for ordering.
    pub published_at: String,
    /// Empty when the item has no enclosure.
    pub audio_url: String,
    pub thumbnail_url: String,
}

impl Default for Episode {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            published_at: DEFAULT_PUBLISHED_AT.to_string(),
            audio_url: String::new(),
            thumbnail_url: PLACEHOLDER_THUMBNAIL_URL.to_string(),
        }
    }
}

impl Episode {
    pub fn has_audio(&self) -> bool {
        !self.audio_url.is_empty()
    }

    /// `published_at` as a timestamp, or `None` when it cannot be parsed.
    pub fn published(&self) -> Option<DateTime<Utc>> {
        parse_pub_date(&self.published_at)
    }
}

/// Accepts the formats feeds use in practice: RFC 2822 (the RSS standard),
/// RFC 3339, and bare ISO dates with or without a time part.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Newest first. Stable, so equal or unparseable dates keep feed order;
/// unparseable dates go last.
pub fn sort_newest_first(episodes: &mut [Episode]) {
    episodes.sort_by_cached_key(|e| std::cmp::Reverse(e.published()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(title: &str, published_at: &str) -> Episode {
        Episode {
            title: title.to_string(),
            published_at: published_at.to_string(),
            ..Episode::default()
        }
    }

    #[test]
    fn test_parse_pub_date_formats() {
        let rfc2822 = parse_pub_date("Tue, 05 Mar 2024 10:00:00 GMT").unwrap();
        let iso = parse_pub_date("2024-03-05").unwrap();
        let rfc3339 = parse_pub_date("2024-03-05T10:00:00+00:00").unwrap();
        let spaced = parse_pub_date("2024-03-05 10:00:00").unwrap();
        assert_eq!(rfc2822, rfc3339);
        assert_eq!(rfc2822, spaced);
        assert!(iso < rfc2822);
        assert!(parse_pub_date("no date").is_none());
        assert!(parse_pub_date("   ").is_none());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut episodes = vec![
            dated("jan", "2024-01-10"),
            dated("broken", "someday"),
            dated("mar", "2024-03-05"),
            dated("feb", "Sat, 10 Feb 2024 08:00:00 +0000"),
        ];
        sort_newest_first(&mut episodes);
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["mar", "feb", "jan", "broken"]);
    }

    #[test]
    fn test_sort_keeps_feed_order_for_ties() {
        let mut episodes = vec![
            dated("a", "2024-01-10"),
            dated("x", "???"),
            dated("b", "2024-01-10"),
            dated("y", ""),
        ];
        sort_newest_first(&mut episodes);
        let titles: Vec<&str> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "x", "y"]);
    }

    #[test]
    fn test_default_episode() {
        let e = Episode::default();
        assert_eq!(e.title, DEFAULT_TITLE);
        assert_eq!(e.description, DEFAULT_DESCRIPTION);
        assert_eq!(e.thumbnail_url, PLACEHOLDER_THUMBNAIL_URL);
        assert!(!e.has_audio());
    }
}
