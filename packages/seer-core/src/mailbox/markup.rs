//! Escape-by-default rendering of message text.
//!
//! Text is read as Markdown. Raw HTML is emitted as escaped text, and links
//! and images collapse to their visible text, so the output only ever
//! contains the tags the Markdown renderer itself produces.

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

/// Render message text into constrained HTML.
pub fn render_markup(text: &str) -> String {
    let events = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH).filter_map(|event| {
        match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Some(Event::Text(raw)),
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => None,
            Event::End(TagEnd::Link | TagEnd::Image) => None,
            other => Some(other),
        }
    });

    let mut output = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut output, events);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(render_markup("The tide turns."), "<p>The tide turns.</p>\n");
    }

    #[test]
    fn test_emphasis_allowed() {
        let html = render_markup("**Beware** the *fog*");
        assert!(html.contains("<strong>Beware</strong>"));
        assert!(html.contains("<em>fog</em>"));
    }

    #[test]
    fn test_raw_html_escaped() {
        let html = render_markup("<script>alert('x')</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_inline_html_escaped() {
        let html = render_markup("hello <img src=x onerror=alert(1)> world");
        assert!(!html.contains("<img"));
        assert!(html.contains("&lt;img"));
    }

    #[test]
    fn test_links_reduced_to_text() {
        let html = render_markup("[the keep](javascript:alert(1))");
        assert!(!html.contains("href"));
        assert!(html.contains("the keep"));
    }
}
