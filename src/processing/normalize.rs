//! Conversion of raw feed entries into canonical articles.
//!
//! Each logical field has its own fallback chain. Nothing here fails:
//! an entry without a usable link is dropped, every other missing or
//! malformed field degrades to a default.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use html_escape::decode_html_entities;
use regex::Regex;
use url::Url;

use crate::domain::article::{CanonicalArticle, UNTITLED};
use crate::domain::entry::{MediaRef, RawEntry};

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

/// U.S. zone abbreviations that generic date parsers treat as ambiguous.
const TZ_ABBREVIATIONS: &[(&str, &str)] = &[
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("UT", "+0000"),
];

const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Normalize a batch, dropping entries without a link.
pub fn normalize_entries(entries: &[RawEntry]) -> Vec<CanonicalArticle> {
    let articles: Vec<CanonicalArticle> = entries.iter().filter_map(normalize).collect();

    let dropped = entries.len() - articles.len();
    if dropped > 0 {
        log::debug!(
            "Dropped {dropped} of {} feed entries without a link",
            entries.len()
        );
    }

    articles
}

/// Normalize one entry, or `None` when it has no usable link.
pub fn normalize(entry: &RawEntry) -> Option<CanonicalArticle> {
    let url = resolve_url(entry)?;
    let content = resolve_content(entry);
    let image_url = resolve_image(entry, content.as_deref(), &url);

    Some(CanonicalArticle {
        title: resolve_title(entry),
        published_at: resolve_published_at(entry),
        url,
        content,
        image_url,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_url(entry: &RawEntry) -> Option<String> {
    non_blank(entry.link.as_deref()).map(|link| link.trim().to_string())
}

fn resolve_title(entry: &RawEntry) -> String {
    non_blank(entry.title.as_deref())
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn resolve_content(entry: &RawEntry) -> Option<String> {
    non_blank(entry.content.as_deref())
        .or_else(|| non_blank(entry.summary.as_deref()))
        .or_else(|| non_blank(entry.description.as_deref()))
        .map(str::to_string)
}

fn first_media_url(media: &[MediaRef]) -> Option<String> {
    media
        .iter()
        .find_map(|m| non_blank(m.url.as_deref()))
        .map(|url| url.trim().to_string())
}

/// Structured image fields first, then the first `<img>` in the content.
fn resolve_image(entry: &RawEntry, content: Option<&str>, article_url: &str) -> Option<String> {
    first_media_url(&entry.media_content)
        .or_else(|| first_media_url(&entry.media_thumbnail))
        .or_else(|| {
            entry
                .enclosures
                .iter()
                .find(|enclosure| enclosure.is_image())
                .map(|enclosure| enclosure.href.clone())
        })
        .or_else(|| {
            entry
                .links
                .iter()
                .find(|link| link.is_image())
                .map(|link| link.href.clone())
        })
        .or_else(|| content.and_then(|html| extract_image_from_html(html, article_url)))
}

/// First `<img src>` in `html`, resolved against `base_url` when relative.
pub fn extract_image_from_html(html: &str, base_url: &str) -> Option<String> {
    let src = IMG_SRC.captures(html)?.get(1)?.as_str().trim();
    if src.is_empty() {
        return None;
    }
    let src = decode_html_entities(src).into_owned();

    match Url::parse(&src) {
        Ok(url) => Some(url.to_string()),
        Err(_) => Some(
            Url::parse(base_url)
                .and_then(|base| base.join(&src))
                .map(|url| url.to_string())
                .unwrap_or(src),
        ),
    }
}

fn resolve_published_at(entry: &RawEntry) -> Option<DateTime<Utc>> {
    entry
        .published
        .as_deref()
        .and_then(parse_date)
        .or_else(|| entry.updated.as_deref().and_then(parse_date))
}

/// Replace a trailing zone abbreviation with its numeric offset.
fn replace_zone_abbreviation(value: &str) -> String {
    if let Some((head, last)) = value.rsplit_once(' ')
        && let Some((_, offset)) = TZ_ABBREVIATIONS
            .iter()
            .find(|(abbr, _)| last.eq_ignore_ascii_case(abbr))
    {
        return format!("{head} {offset}");
    }
    value.to_string()
}

/// Parse a feed date string, or `None` when no known shape matches.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    let value = replace_zone_abbreviation(value);

    if let Ok(parsed) = DateTime::parse_from_rfc2822(&value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::<FixedOffset>::parse_from_str(&value, format).ok())
    {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&value, format).ok())
    {
        return Some(parsed.and_utc());
    }

    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::entry::TypedLink;

    fn entry(link: &str) -> RawEntry {
        RawEntry {
            link: Some(link.to_string()),
            ..Default::default()
        }
    }

    fn media(url: &str) -> MediaRef {
        MediaRef {
            url: Some(url.to_string()),
            mime_type: Some("image/jpeg".to_string()),
        }
    }

    #[test]
    fn entries_without_link_are_dropped() {
        let entries = vec![
            entry("https://example.com/1"),
            RawEntry {
                title: Some("No link".to_string()),
                ..Default::default()
            },
            RawEntry {
                link: Some("   ".to_string()),
                ..Default::default()
            },
            entry("https://example.com/2"),
        ];

        let articles = normalize_entries(&entries);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].url, "https://example.com/1");
        assert_eq!(articles[1].url, "https://example.com/2");
    }

    #[test]
    fn missing_or_blank_title_becomes_untitled() {
        let article = normalize(&entry("https://example.com/a")).expect("has link");
        assert_eq!(article.title, "Untitled");

        let blank = RawEntry {
            title: Some(" ".to_string()),
            ..entry("https://example.com/a")
        };
        assert_eq!(normalize(&blank).expect("has link").title, "Untitled");
    }

    #[test]
    fn content_prefers_rich_content_then_summary_then_description() {
        let mut raw = RawEntry {
            content: Some("rich".to_string()),
            summary: Some("summary".to_string()),
            description: Some("description".to_string()),
            ..entry("https://example.com/a")
        };
        assert_eq!(normalize(&raw).expect("has link").content.as_deref(), Some("rich"));

        raw.content = Some("".to_string());
        assert_eq!(
            normalize(&raw).expect("has link").content.as_deref(),
            Some("summary")
        );

        raw.summary = None;
        assert_eq!(
            normalize(&raw).expect("has link").content.as_deref(),
            Some("description")
        );

        raw.description = None;
        assert_eq!(normalize(&raw).expect("has link").content, None);
    }

    #[test]
    fn image_is_scanned_from_description_html() {
        let raw = RawEntry {
            title: Some("A".to_string()),
            description: Some("<img src='https://x/i.jpg'/> hi".to_string()),
            ..entry("https://x/1")
        };

        let article = normalize(&raw).expect("has link");

        assert_eq!(article.image_url.as_deref(), Some("https://x/i.jpg"));
    }

    #[test]
    fn structured_media_wins_over_html_image() {
        let raw = RawEntry {
            content: Some(r#"<img src="https://example.com/inline.jpg">"#.to_string()),
            media_content: vec![media("https://example.com/media.jpg")],
            ..entry("https://example.com/a")
        };

        let article = normalize(&raw).expect("has link");

        assert_eq!(
            article.image_url.as_deref(),
            Some("https://example.com/media.jpg")
        );
    }

    #[test]
    fn image_sources_follow_priority_order() {
        let mut raw = RawEntry {
            media_thumbnail: vec![media("https://example.com/thumb.jpg")],
            enclosures: vec![
                TypedLink {
                    href: "https://example.com/audio.mp3".to_string(),
                    mime_type: Some("audio/mpeg".to_string()),
                },
                TypedLink {
                    href: "https://example.com/enclosure.png".to_string(),
                    mime_type: Some("image/png".to_string()),
                },
            ],
            links: vec![TypedLink {
                href: "https://example.com/link.gif".to_string(),
                mime_type: Some("image/gif".to_string()),
            }],
            ..entry("https://example.com/a")
        };
        assert_eq!(
            normalize(&raw).expect("has link").image_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );

        raw.media_thumbnail.clear();
        assert_eq!(
            normalize(&raw).expect("has link").image_url.as_deref(),
            Some("https://example.com/enclosure.png")
        );

        raw.enclosures.clear();
        assert_eq!(
            normalize(&raw).expect("has link").image_url.as_deref(),
            Some("https://example.com/link.gif")
        );

        raw.links.clear();
        assert_eq!(normalize(&raw).expect("has link").image_url, None);
    }

    #[test]
    fn media_without_url_falls_through() {
        let raw = RawEntry {
            media_content: vec![MediaRef::default()],
            media_thumbnail: vec![media("https://example.com/thumb.jpg")],
            ..entry("https://example.com/a")
        };

        assert_eq!(
            normalize(&raw).expect("has link").image_url.as_deref(),
            Some("https://example.com/thumb.jpg")
        );
    }

    #[test]
    fn html_image_picks_first_img_tag() {
        let html = r#"<a href="https://example.com/full.jpg">
            <img class="alignleft" src="https://example.com/thumb-image.jpg" width="248" />
        </a><img src="https://example.com/second.jpg">"#;

        assert_eq!(
            extract_image_from_html(html, "https://example.com/article").as_deref(),
            Some("https://example.com/thumb-image.jpg")
        );
    }

    #[test]
    fn html_image_ignores_lazy_load_attributes() {
        let html = r#"<img data-src="https://example.com/lazy.jpg" src="https://example.com/real.jpg">"#;

        assert_eq!(
            extract_image_from_html(html, "https://example.com/article").as_deref(),
            Some("https://example.com/real.jpg")
        );
    }

    #[test]
    fn html_image_resolves_relative_and_escaped_sources() {
        assert_eq!(
            extract_image_from_html(r#"<img src="/img/a.jpg?w=1&amp;h=2">"#, "https://example.com/post/1")
                .as_deref(),
            Some("https://example.com/img/a.jpg?w=1&h=2")
        );
        assert_eq!(extract_image_from_html("<p>no images</p>", "https://example.com"), None);
    }

    #[test]
    fn parses_rfc2822_dates() {
        assert_eq!(
            parse_date("Mon, 01 Jan 2024 12:00:00 GMT"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("Mon, 01 Jan 2024 12:00:00 +0200"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn us_zone_abbreviations_map_to_fixed_offsets() {
        assert_eq!(
            parse_date("Tue, 02 Jan 2024 08:30:00 EST"),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 13, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("Tue, 02 Jul 2024 08:30:00 PDT"),
            Some(Utc.with_ymd_and_hms(2024, 7, 2, 15, 30, 0).unwrap())
        );
        assert_eq!(
            parse_date("2024-03-05 10:00:00 CDT"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn parses_iso_and_naive_dates() {
        assert_eq!(
            parse_date("2024-01-01T12:00:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2024-01-01 12:00:00"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_date("2024-01-01"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_dates_are_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday-ish"), None);
        assert_eq!(parse_date("Mon, 99 Foo 2024 12:00:00 XYZ"), None);
    }

    #[test]
    fn invalid_published_falls_back_to_updated() {
        let raw = RawEntry {
            published: Some("not a date".to_string()),
            updated: Some("2024-02-03T04:05:06Z".to_string()),
            ..entry("https://example.com/a")
        };

        assert_eq!(
            normalize(&raw).expect("has link").published_at,
            Some(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap())
        );
    }
}
