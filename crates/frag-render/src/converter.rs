use frag_types::{bare_type, is_markdown, HTML};
use tracing::debug;

use crate::markdown::markdown_to_html;

/// Converts fragment content between representations.
///
/// Implementations are pure: the same input always yields the same output
/// and nothing is persisted. Types are bare MIME types.
pub trait FormatConverter: Send + Sync {
    fn convert(&self, source_type: &str, data: &[u8], target_type: &str) -> Vec<u8>;
}

/// The built-in converter.
///
/// Markdown → HTML is rendered; every other pair (a type served as
/// itself, or markdown under its alias) passes the bytes through.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardConverter;

impl FormatConverter for StandardConverter {
    fn convert(&self, source_type: &str, data: &[u8], target_type: &str) -> Vec<u8> {
        let source = bare_type(source_type);
        let target = bare_type(target_type);
        if is_markdown(source) && target.eq_ignore_ascii_case(HTML) {
            debug!(bytes = data.len(), "rendering markdown to html");
            return markdown_to_html(data);
        }
        data.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_to_html_pair_renders() {
        let out = StandardConverter.convert("text/markdown", b"# Hi\n", "text/html");
        assert_eq!(out, b"<h1>Hi</h1>\n");
    }

    #[test]
    fn alias_and_parameters_are_understood() {
        let out = StandardConverter.convert("text/md; charset=utf-8", b"_x_\n", "text/html");
        assert_eq!(out, b"<p><em>x</em></p>\n");
    }

    #[test]
    fn same_type_passes_through() {
        let data = b"# not rendered\n";
        assert_eq!(StandardConverter.convert("text/markdown", data, "text/markdown"), data);
        assert_eq!(StandardConverter.convert("text/plain", data, "text/plain"), data);
    }

    #[test]
    fn usable_as_trait_object() {
        let converter: Box<dyn FormatConverter> = Box::new(StandardConverter);
        assert_eq!(converter.convert("text/markdown", b"", "text/html"), b"");
    }
}
