//! Markdown to HTML conversion.
//!
//! Thin wrapper over [pulldown-cmark](https://docs.rs/pulldown-cmark). Tables
//! and strikethrough are enabled on top of CommonMark; raw HTML in the source
//! passes through untouched.

use pulldown_cmark::{Options, Parser, html as md_html};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Render markdown text to an HTML fragment.
pub fn render_markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, options());
    let mut html = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_becomes_h1() {
        assert_eq!(render_markdown("# Hi"), "<h1>Hi</h1>\n");
    }

    #[test]
    fn paragraphs_and_emphasis() {
        let html = render_markdown("Some *emphasis* here.\n\nSecond.");
        assert!(html.contains("<p>Some <em>emphasis</em> here.</p>"));
        assert!(html.contains("<p>Second.</p>"));
    }

    #[test]
    fn tables_enabled() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn strikethrough_enabled() {
        assert!(render_markdown("~~gone~~").contains("<del>gone</del>"));
    }

    #[test]
    fn empty_source_is_empty_html() {
        assert_eq!(render_markdown(""), "");
    }
}
