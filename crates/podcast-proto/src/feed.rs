//! RSS 2.0 → `Episode` mapping.
//!
//! Only direct children of `<item>` are read, so a `<title>` nested inside an
//! item's `<image>` block never shadows the episode title. The one nested
//! field we do look at is `<image><url>`, used as a thumbnail fallback.
//!
//! Thumbnail resolution order:
//!   1. `<itunes:image href="…"/>`
//!   2. `<image><url>…</url></image>`
//!   3. `<image href="…"/>`
//!   4. placeholder

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::episode::{
    sort_newest_first, Episode, DEFAULT_DESCRIPTION, DEFAULT_PUBLISHED_AT, DEFAULT_TITLE,
    PLACEHOLDER_THUMBNAIL_URL,
};
use crate::error::FeedError;

/// Parse a feed body and return its episodes, newest first.
pub fn parse_feed(xml: &str) -> Result<Vec<Episode>, FeedError> {
    let mut episodes = parse_items(xml)?;
    if episodes.is_empty() {
        return Err(FeedError::Parse("no <item> found in RSS feed".to_string()));
    }
    sort_newest_first(&mut episodes);
    Ok(episodes)
}

/// Parse every `<item>` in document order, without sorting.
pub fn parse_items(xml: &str) -> Result<Vec<Episode>, FeedError> {
    // Text and CDATA segments of one field are joined untrimmed; the field is
    // trimmed once in `into_episode`.
    let mut reader = Reader::from_str(xml);

    let mut episodes = Vec::new();
    // Some(..) while inside an <item>; `path` holds the open elements below it.
    let mut current: Option<ItemFields> = None;
    let mut path: Vec<String> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            FeedError::Parse(format!(
                "XML error at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                match current.as_mut() {
                    Some(fields) => {
                        fields.on_element(&path, &name, &e)?;
                        path.push(name);
                    }
                    None if name == "item" => {
                        current = Some(ItemFields::default());
                        path.clear();
                    }
                    None => {}
                }
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                match current.as_mut() {
                    Some(fields) => fields.on_element(&path, &name, &e)?,
                    None if name == "item" => episodes.push(ItemFields::default().into_episode()),
                    None => {}
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if path.pop().is_none() {
                        if let Some(fields) = current.take() {
                            episodes.push(fields.into_episode());
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(fields) = current.as_mut() {
                    fields.on_text(&path, &decode_text(&t));
                }
            }
            Event::CData(c) => {
                if let Some(fields) = current.as_mut() {
                    fields.on_text(&path, &String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        return Err(FeedError::Parse(
            "unexpected end of document inside <item>".to_string(),
        ));
    }

    debug!("feed: parsed {} items", episodes.len());
    Ok(episodes)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Unescape entities; fall back to the raw text for HTML entities such as
/// `&nbsp;` that XML does not define.
fn decode_text(t: &BytesText<'_>) -> String {
    match t.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(t).into_owned(),
    }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, FeedError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| FeedError::Parse(format!("bad attribute: {}", err)))?;
        if attr.key.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| FeedError::Parse(format!("bad attribute value: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[derive(Default)]
struct ItemFields {
    title: String,
    description: String,
    pub_date: String,
    audio_url: Option<String>,
    itunes_image: Option<String>,
    image_url_text: String,
    image_href: Option<String>,
}

impl ItemFields {
    /// Called for every element opened (or self-closed) inside the item.
    /// `path` is the chain of elements between `<item>` and this one.
    fn on_element(
        &mut self,
        path: &[String],
        name: &str,
        e: &BytesStart<'_>,
    ) -> Result<(), FeedError> {
        if !path.is_empty() {
            return Ok(());
        }
        match name {
            "enclosure" if self.audio_url.is_none() => {
                self.audio_url = non_blank(attribute(e, "url")?);
            }
            "itunes:image" if self.itunes_image.is_none() => {
                self.itunes_image = non_blank(attribute(e, "href")?);
            }
            "image" if self.image_href.is_none() => {
                self.image_href = non_blank(attribute(e, "href")?);
            }
            _ => {}
        }
        Ok(())
    }

    fn on_text(&mut self, path: &[String], text: &str) {
        let target = match path {
            [field] if field == "title" => &mut self.title,
            [field] if field == "description" => &mut self.description,
            [field] if field == "pubDate" => &mut self.pub_date,
            [image, url] if image == "image" && url == "url" => &mut self.image_url_text,
            _ => return,
        };
        target.push_str(text);
    }

    fn into_episode(self) -> Episode {
        let thumbnail_url = self
            .itunes_image
            .or_else(|| non_blank(Some(self.image_url_text)))
            .or(self.image_href)
            .unwrap_or_else(|| PLACEHOLDER_THUMBNAIL_URL.to_string());

        Episode {
            title: or_default(self.title, DEFAULT_TITLE),
            description: or_default(self.description, DEFAULT_DESCRIPTION),
            published_at: or_default(self.pub_date, DEFAULT_PUBLISHED_AT),
            audio_url: self.audio_url.unwrap_or_default(),
            thumbnail_url,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_default(value: String, default: &str) -> String {
    non_blank(Some(value)).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
  <channel>
    <title>Show</title>
    <image><url>https://example.com/channel.png</url><title>Show</title></image>
    {items}
  </channel>
</rss>"#
        )
    }

    #[test]
    fn test_full_item() {
        let xml = rss(r#"
            <item>
              <title>Episode 1</title>
              <description><![CDATA[<p>Hello &amp; welcome</p>]]></description>
              <pubDate>Tue, 05 Mar 2024 10:00:00 GMT</pubDate>
              <enclosure url="https://cdn.example.com/ep1.mp3" type="audio/mpeg" length="1"/>
              <itunes:image href="https://example.com/ep1.jpg"/>
            </item>"#);
        let episodes = parse_feed(&xml).unwrap();
        assert_eq!(episodes.len(), 1);
        let ep = &episodes[0];
        assert_eq!(ep.title, "Episode 1");
        assert_eq!(ep.description, "<p>Hello &amp; welcome</p>");
        assert_eq!(ep.published_at, "Tue, 05 Mar 2024 10:00:00 GMT");
        assert_eq!(ep.audio_url, "https://cdn.example.com/ep1.mp3");
        assert_eq!(ep.thumbnail_url, "https://example.com/ep1.jpg");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let xml = rss("<item><pubDate>2024-01-10</pubDate></item>");
        let episodes = parse_feed(&xml).unwrap();
        let ep = &episodes[0];
        assert_eq!(ep.title, DEFAULT_TITLE);
        assert_eq!(ep.description, DEFAULT_DESCRIPTION);
        assert_eq!(ep.audio_url, "");
        assert_eq!(ep.thumbnail_url, PLACEHOLDER_THUMBNAIL_URL);
    }

    #[test]
    fn test_blank_elements_count_as_absent() {
        let xml = rss("<item><title>   </title><description/></item>");
        let ep = &parse_feed(&xml).unwrap()[0];
        assert_eq!(ep.title, DEFAULT_TITLE);
        assert_eq!(ep.description, DEFAULT_DESCRIPTION);
        assert_eq!(ep.published_at, DEFAULT_PUBLISHED_AT);
    }

    #[test]
    fn test_entities_are_unescaped() {
        let xml = rss("<item><title>Rock &amp; Roll &lt;live&gt;</title></item>");
        assert_eq!(parse_feed(&xml).unwrap()[0].title, "Rock & Roll <live>");
    }

    #[test]
    fn test_mixed_text_and_cdata_keep_inner_spacing() {
        let xml = rss(concat!(
            "<item>\n",
            "  <title>\n    foo <![CDATA[bar]]> baz\n  </title>\n",
            "  <description><![CDATA[<b>Part</b>]]> two &amp; three</description>\n",
            "</item>",
        ));
        let ep = &parse_feed(&xml).unwrap()[0];
        assert_eq!(ep.title, "foo bar baz");
        assert_eq!(ep.description, "<b>Part</b> two & three");
    }

    #[test]
    fn test_thumbnail_resolution_order() {
        let xml = rss(r#"
            <item><title>itunes</title><pubDate>2024-01-04</pubDate>
              <image href="https://example.com/generic.jpg"/>
              <image><url>https://example.com/nested.jpg</url></image>
              <itunes:image href="https://example.com/itunes.jpg"/>
            </item>
            <item><title>nested</title><pubDate>2024-01-03</pubDate>
              <image><url>https://example.com/nested.jpg</url></image>
              <image href="https://example.com/generic.jpg"/>
            </item>
            <item><title>generic</title><pubDate>2024-01-02</pubDate>
              <image href="https://example.com/generic.jpg"/>
            </item>
            <item><title>none</title><pubDate>2024-01-01</pubDate></item>"#);
        let thumbs: Vec<String> = parse_feed(&xml)
            .unwrap()
            .into_iter()
            .map(|e| e.thumbnail_url)
            .collect();
        assert_eq!(
            thumbs,
            [
                "https://example.com/itunes.jpg",
                "https://example.com/nested.jpg",
                "https://example.com/generic.jpg",
                PLACEHOLDER_THUMBNAIL_URL,
            ]
        );
    }

    #[test]
    fn test_nested_title_does_not_shadow_item_title() {
        let xml = rss(r#"
            <item>
              <image><url>https://example.com/a.jpg</url><title>image caption</title></image>
              <title>Real title</title>
            </item>"#);
        assert_eq!(parse_feed(&xml).unwrap()[0].title, "Real title");
    }

    #[test]
    fn test_first_enclosure_wins() {
        let xml = rss(r#"
            <item>
              <enclosure url="https://example.com/a.mp3"/>
              <enclosure url="https://example.com/b.mp3"/>
            </item>"#);
        assert_eq!(parse_feed(&xml).unwrap()[0].audio_url, "https://example.com/a.mp3");
    }

    #[test]
    fn test_sorted_newest_first() {
        let xml = rss(r#"
            <item><title>January</title><pubDate>2024-01-10</pubDate></item>
            <item><title>March</title><pubDate>2024-03-05</pubDate></item>"#);
        let titles: Vec<String> = parse_feed(&xml).unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, ["March", "January"]);
    }

    #[test]
    fn test_zero_items_is_parse_error() {
        let err = parse_feed(&rss("")).unwrap_err();
        assert!(matches!(err, FeedError::Parse(ref m) if m.contains("<item>")), "{err}");
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_feed("<rss><channel><item><title>x</item></channel></rss>").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)), "{err}");
    }

    #[test]
    fn test_truncated_document_is_parse_error() {
        let err = parse_feed("<rss><channel><item><title>x</title>").unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)), "{err}");
    }

    #[test]
    fn test_html_body_is_parse_error() {
        assert!(parse_feed("Service temporarily unavailable").is_err());
    }
}
