//! Markdown → HTML for the explanation panel.
//!
//! Uses `pulldown-cmark` with tables and strikethrough enabled. Raw HTML in
//! the source is rendered as escaped text rather than passed through, so a
//! model answer cannot inject markup into the page.
use pulldown_cmark::{Event, Options, Parser, html};

pub fn to_html(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
