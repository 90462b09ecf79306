use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{Result, TelegramError};
use crate::types::{PreviewMessage, PreviewPage};

const PREVIEW_BASE_URL: &str = "https://t.me/s";

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

/// Reader for the public web preview Telegram serves for open channels.
#[derive(Clone)]
pub struct ChannelPreview {
    client: reqwest::Client,
    base_url: String,
}

impl Default for ChannelPreview {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelPreview {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: PREVIEW_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch up to `limit` of the newest text messages, newest first.
    pub async fn recent_messages(&self, username: &str, limit: usize) -> Result<Vec<PreviewMessage>> {
        let url = format!("{}/{}", self.base_url, username);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TelegramError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let html = resp.text().await?;
        let page = parse_preview(&html);
        if !page.has_feed {
            return Err(TelegramError::PreviewUnavailable(username.to_string()));
        }

        tracing::debug!(username, found = page.messages.len(), "Parsed channel preview");

        Ok(page.messages.into_iter().rev().take(limit).collect())
    }
}

/// Parse a `t.me/s/<name>` page. Messages without text are dropped.
pub fn parse_preview(html: &str) -> PreviewPage {
    let document = Html::parse_document(html);

    let feed_selector = selector(".tgme_channel_history");
    let message_selector = selector(".tgme_widget_message[data-post]");
    let text_selector = selector(".tgme_widget_message_text");
    let time_selector = selector(".tgme_widget_message_date time[datetime]");
    let title_selector = selector(".tgme_channel_info_header_title");
    let og_title_selector = selector("meta[property=\"og:title\"]");

    let title = document
        .select(&title_selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&og_title_selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(str::to_string)
        });

    let has_feed = document.select(&feed_selector).next().is_some();

    let mut messages = Vec::new();
    for element in document.select(&message_selector) {
        let Some(id) = element
            .value()
            .attr("data-post")
            .and_then(|post| post.rsplit('/').next())
            .and_then(|id| id.parse::<i64>().ok())
        else {
            continue;
        };

        // Replies embed the quoted message's text under the same class.
        let Some(text_el) = element.select(&text_selector).find(|el| {
            !el.value()
                .classes()
                .any(|c| c == "js-message_reply_text")
        }) else {
            continue;
        };

        let text = element_text(text_el);
        if text.trim().is_empty() {
            continue;
        }

        let date = element
            .select(&time_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        messages.push(PreviewMessage { id, text, date });
    }

    PreviewPage {
        title,
        has_feed,
        messages,
    }
}

/// Text content with `<br>` turned into newlines.
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><head><meta property="og:title" content="City News"></head>
<body>
<div class="tgme_channel_info"><div class="tgme_channel_info_header_title"><span>City  News</span></div></div>
<section class="tgme_channel_history">
  <div class="tgme_widget_message" data-post="city_news/41">
    <div class="tgme_widget_message_text js-message_text">Old post<br>second line</div>
    <a class="tgme_widget_message_date"><time datetime="2024-05-01T10:00:00+00:00"></time></a>
  </div>
  <div class="tgme_widget_message" data-post="city_news/42">
    <div class="tgme_widget_message_reply">
      <div class="tgme_widget_message_text js-message_reply_text">quoted text</div>
    </div>
    <div class="tgme_widget_message_text js-message_text">Завтра <b>встреча</b> в 15:00</div>
    <a class="tgme_widget_message_date"><time datetime="2024-05-02T12:30:00+03:00"></time></a>
  </div>
  <div class="tgme_widget_message" data-post="city_news/43">
    <div class="tgme_widget_message_photo"></div>
  </div>
</section>
</body></html>"#;

    #[test]
    fn parses_messages_in_page_order() {
        let page = parse_preview(PAGE);
        assert!(page.has_feed);
        assert_eq!(page.title.as_deref(), Some("City News"));
        let ids: Vec<i64> = page.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![41, 42]);
    }

    #[test]
    fn line_breaks_and_inline_markup_become_plain_text() {
        let page = parse_preview(PAGE);
        assert_eq!(page.messages[0].text, "Old post\nsecond line");
        assert_eq!(page.messages[1].text, "Завтра встреча в 15:00");
    }

    #[test]
    fn reply_quote_is_not_taken_as_message_text() {
        let page = parse_preview(PAGE);
        assert!(!page.messages[1].text.contains("quoted"));
    }

    #[test]
    fn message_date_is_normalized_to_utc() {
        let page = parse_preview(PAGE);
        let date = page.messages[1].date.unwrap();
        assert_eq!(date.to_rfc3339(), "2024-05-02T09:30:00+00:00");
    }

    #[test]
    fn landing_page_has_no_feed() {
        let html = r#"<html><head><meta property="og:title" content="Secret chat"></head>
            <body><div class="tgme_page_title">Secret chat</div></body></html>"#;
        let page = parse_preview(html);
        assert!(!page.has_feed);
        assert!(page.messages.is_empty());
        assert_eq!(page.title.as_deref(), Some("Secret chat"));
    }
}
