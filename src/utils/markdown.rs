use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Render a topic or comment body to sanitized HTML.
///
/// Messages are short plain-text posts, so only inline Markdown, lists,
/// quotes and code blocks survive; raw HTML from the author is stripped.
pub fn render_markdown(raw: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.render.hardbreaks = true;
    options.render.unsafe_ = true; // ammonia sanitizes below

    let html = markdown_to_html(raw, &options);
    sanitize_html(&html)
}

fn sanitize_html(html: &str) -> String {
    let tags: HashSet<&str> = [
        "p", "br", "a", "em", "strong", "del", "code", "pre", "blockquote", "ul", "ol", "li",
    ]
    .iter()
    .copied()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].iter().copied().collect();

    let mut builder = Builder::default();
    builder.tags(tags);
    builder.add_tag_attributes("a", &["href", "title"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.url_schemes(url_schemes);
    builder.link_rel(Some("noopener noreferrer nofollow"));

    builder.clean(html).to_string()
}
