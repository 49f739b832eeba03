use pulldown_cmark::{html, Options, Parser};

/// CommonMark plus the usual extensions: tables, strikethrough, task
/// lists and footnotes.
fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Render markdown source to an HTML fragment.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD before parsing.
pub fn markdown_to_html(source: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(source);
    let parser = Parser::new_ext(&text, options());
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(md: &str) -> String {
        String::from_utf8(markdown_to_html(md.as_bytes())).unwrap()
    }

    #[test]
    fn heading_is_byte_exact() {
        assert_eq!(render("### Hello!\n"), "<h3>Hello!</h3>\n");
    }

    #[test]
    fn emphasis_and_links() {
        assert_eq!(
            render("*a* **b** [c](https://example.com)\n"),
            "<p><em>a</em> <strong>b</strong> <a href=\"https://example.com\">c</a></p>\n"
        );
    }

    #[test]
    fn lists() {
        assert_eq!(render("- one\n- two\n"), "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n");
    }

    #[test]
    fn fenced_code_is_escaped() {
        assert_eq!(
            render("```rust\nlet x = 1 < 2;\n```\n"),
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>\n"
        );
    }

    #[test]
    fn strikethrough_extension() {
        assert_eq!(render("~~gone~~\n"), "<p><del>gone</del></p>\n");
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(markdown_to_html(b"").is_empty());
    }

    #[test]
    fn invalid_utf8_does_not_fail() {
        let out = markdown_to_html(&[b'#', b' ', 0xff, b'\n']);
        assert_eq!(String::from_utf8(out).unwrap(), "<h1>\u{fffd}</h1>\n");
    }
}
