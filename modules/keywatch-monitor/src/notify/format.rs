use keywatch_common::Match;

use crate::enrichment::Enrichment;

/// Escape free text for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Telegram-HTML notification for one Match.
pub fn format_message(m: &Match, enrichment: Option<&Enrichment>) -> String {
    let keywords = m
        .keywords
        .iter()
        .map(|k| escape_html(k))
        .collect::<Vec<_>>()
        .join(", ");

    let mut message = format!(
        "🔍 <b>Keyword match</b>\n\n\
         📱 <b>Source:</b> {source}\n\
         👥 <b>{kind}:</b> <a href=\"{entity_url}\">{entity_name}</a>\n\
         🔑 <b>Keywords:</b> {keywords}\n\
         📅 <b>Date:</b> {date}\n\n\
         📝 <b>Text:</b>\n{text}\n\n\
         🔗 <a href=\"{url}\">Open original</a>",
        source = m.source.label(),
        kind = m.entity_kind.label(),
        entity_url = escape_attr(&m.entity_url),
        entity_name = escape_html(&m.entity_name),
        date = m.display_date(),
        text = escape_html(&m.text),
        url = escape_attr(&m.url),
    );

    match enrichment {
        Some(Enrichment::Analysis { text, model }) => {
            message.push_str(&format!(
                "\n\n🤖 <b>AI analysis</b> ({}):\n{}",
                escape_html(model),
                escape_html(text)
            ));
        }
        Some(Enrichment::Failed { reason }) => {
            message.push_str(&format!("\n\n⚠️ Enrichment failed: {}", escape_html(reason)));
        }
        None => {}
    }

    message
}
