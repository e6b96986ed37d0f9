//! Markdown content extractor.

use async_trait::async_trait;
use mdrag_core::{Document, DocumentExtractor, ExtractError};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Extractor for Markdown files.
///
/// Parses CommonMark and keeps only the visible text, so headings, emphasis
/// markers, link targets and raw HTML never reach the chunker. Block
/// boundaries become blank lines, which the chunker prefers as split points.
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    /// Create a new Markdown extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Strip markup from a Markdown string.
    #[must_use]
    pub fn strip_markup(markdown: &str) -> String {
        let mut text = String::with_capacity(markdown.len());

        for event in Parser::new(markdown) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::CodeBlock
                    | TagEnd::BlockQuote(_)
                    | TagEnd::TableRow
                    | TagEnd::TableHead,
                ) => push_block_break(&mut text),
                Event::Start(Tag::Table(_)) | Event::End(TagEnd::Table) => {
                    push_block_break(&mut text);
                }
                // Raw HTML carries no prose
                Event::Html(_) | Event::InlineHtml(_) => {}
                _ => {}
            }
        }

        // Collapse the trailing block break
        while text.ends_with('\n') {
            text.pop();
        }
        text
    }
}

fn push_block_break(text: &mut String) {
    if !text.is_empty() && !text.ends_with("\n\n") {
        while text.ends_with('\n') {
            text.pop();
        }
        text.push_str("\n\n");
    }
}

impl Default for MarkdownExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentExtractor for MarkdownExtractor {
    fn supported_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    async fn extract(&self, path: &Path) -> Result<Document, ExtractError> {
        let raw = fs::read_to_string(path).await?;
        let text = Self::strip_markup(&raw);
        debug!(path = %path.display(), chars = text.chars().count(), "extracted markdown");
        Ok(Document::new(path, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_extractor() {
        let extractor = MarkdownExtractor::new();
        assert_eq!(extractor.supported_extensions(), &["md", "markdown"]);
    }

    #[test]
    fn test_can_extract_markdown_extensions() {
        let extractor = MarkdownExtractor::new();
        assert!(extractor.can_extract(Path::new("/docs/README.md")));
        assert!(extractor.can_extract(Path::new("/docs/guide.markdown")));
        assert!(extractor.can_extract(Path::new("/docs/UPPER.MD")));
        assert!(!extractor.can_extract(Path::new("/docs/notes.txt")));
        assert!(!extractor.can_extract(Path::new("/docs/no_extension")));
    }

    #[test]
    fn test_strip_heading_markers() {
        let text = MarkdownExtractor::strip_markup("# Title\n\nBody text.");
        assert_eq!(text, "Title\n\nBody text.");
    }

    #[test]
    fn test_strip_emphasis_markers() {
        let text = MarkdownExtractor::strip_markup("Some *emphasized* and **bold** words.");
        assert_eq!(text, "Some emphasized and bold words.");
    }

    #[test]
    fn test_strip_link_keeps_label() {
        let text = MarkdownExtractor::strip_markup("See [the docs](https://example.com) here.");
        assert_eq!(text, "See the docs here.");
        assert!(!text.contains("example.com"));
    }

    #[test]
    fn test_inline_code_kept() {
        let text = MarkdownExtractor::strip_markup("Run `cargo doc` to build.");
        assert_eq!(text, "Run cargo doc to build.");
    }

    #[test]
    fn test_code_block_kept_as_text() {
        let text = MarkdownExtractor::strip_markup("Intro.\n\n```\nlet x = 1;\n```\n\nOutro.");
        assert!(text.contains("let x = 1;"));
        assert!(!text.contains("```"));
    }

    #[test]
    fn test_raw_html_dropped() {
        let text = MarkdownExtractor::strip_markup("Before.\n\n<div class=\"x\">ignored</div>\n\nAfter.");
        assert!(!text.contains("<div"));
    }

    #[test]
    fn test_list_items_become_blocks() {
        let text = MarkdownExtractor::strip_markup("- alpha\n- beta\n- gamma");
        assert_eq!(text, "alpha\n\nbeta\n\ngamma");
    }

    #[test]
    fn test_soft_break_becomes_space() {
        let text = MarkdownExtractor::strip_markup("line one\nline two");
        assert_eq!(text, "line one line two");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(MarkdownExtractor::strip_markup(""), "");
    }

    #[tokio::test]
    async fn test_extract_reads_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("page.md");
        std::fs::write(&file_path, "# Hello\n\nWorld.").unwrap();

        let extractor = MarkdownExtractor::new();
        let doc = extractor.extract(&file_path).await.unwrap();

        assert_eq!(doc.path, file_path);
        assert_eq!(doc.text, "Hello\n\nWorld.");
    }

    #[tokio::test]
    async fn test_extract_nonexistent_file_fails() {
        let extractor = MarkdownExtractor::new();
        let result = extractor.extract(Path::new("/nonexistent/page.md")).await;

        assert!(matches!(result, Err(ExtractError::Io(_))));
    }

    #[tokio::test]
    async fn test_extract_handles_unicode() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("unicode.md");
        std::fs::write(&file_path, "# 世界\n\nПривет мир!").unwrap();

        let extractor = MarkdownExtractor::new();
        let doc = extractor.extract(&file_path).await.unwrap();

        assert_eq!(doc.text, "世界\n\nПривет мир!");
    }
}
