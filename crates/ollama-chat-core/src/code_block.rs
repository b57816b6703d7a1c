//! Code-block extraction from markdown messages
//!
//! Messages are split into prose and code segments so that fenced blocks can
//! be rendered with copy/preview actions while everything else goes through
//! the ordinary markdown renderer.

use std::sync::OnceLock;

use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd};
use regex::Regex;

use crate::preview::PreviewKind;

fn language_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```(\w+)").expect("static language pattern"))
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```\w*\n?|```$").expect("static fence pattern"))
}

/// A fenced (or indented) block of code inside a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Lower-cased language tag, empty when the fence carries none
    pub language: String,
    pub body: String,
}

impl CodeBlock {
    pub fn new(language: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            body: body.into(),
        }
    }

    /// Parse the raw source of a triple-backtick block, fences included.
    pub fn from_fence(raw: &str) -> Self {
        let language = fence_language(raw);

        let stripped = fence_re().replace_all(raw, "");
        let stripped = stripped.trim_end_matches([' ', '\t']);
        let body = stripped.strip_suffix('\n').unwrap_or(stripped);

        Self::new(language, body)
    }

    pub fn preview_kind(&self) -> Option<PreviewKind> {
        PreviewKind::for_language(&self.language)
    }

    pub fn can_preview(&self) -> bool {
        self.preview_kind().is_some()
    }
}

/// A slice of a rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Markdown source outside of any code block
    Prose(String),
    Code(CodeBlock),
}

/// Split `text` into prose and code-block segments, in document order.
pub fn segment_message(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    let mut open: Option<(CodeBlockKind<'_>, std::ops::Range<usize>)> = None;
    let mut code = String::new();

    for (event, range) in Parser::new(text).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                push_prose(&mut segments, &text[cursor..range.start]);
                code.clear();
                open = Some((kind, range));
            }
            Event::Text(chunk) if open.is_some() => code.push_str(&chunk),
            Event::End(TagEnd::CodeBlock) => {
                if let Some((kind, range)) = open.take() {
                    let raw = &text[range.clone()];
                    segments.push(Segment::Code(build_block(&kind, raw, &code)));
                    cursor = range.end;
                }
            }
            _ => {}
        }
    }

    push_prose(&mut segments, &text[cursor..]);
    segments
}

/// Code blocks of `text`, in document order.
pub fn code_blocks(text: &str) -> Vec<CodeBlock> {
    segment_message(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Code(block) => Some(block),
            Segment::Prose(_) => None,
        })
        .collect()
}

fn push_prose(segments: &mut Vec<Segment>, prose: &str) {
    if !prose.trim().is_empty() {
        segments.push(Segment::Prose(prose.to_string()));
    }
}

fn build_block(kind: &CodeBlockKind<'_>, raw: &str, code: &str) -> CodeBlock {
    // `code` comes from the parser with list indentation and `> ` markers
    // already removed, so the body is always taken from it.
    match kind {
        CodeBlockKind::Fenced(info) => {
            let raw = raw.trim_start_matches([' ', '\t']);
            let language = if is_plain_backtick_fence(raw) {
                fence_language(raw)
            } else {
                // Tilde fences and fences longer than three backticks.
                language_from_info(info)
            };
            CodeBlock::new(language, trim_code(code))
        }
        CodeBlockKind::Indented => CodeBlock::new("", trim_code(code)),
    }
}

fn fence_language(raw: &str) -> String {
    language_re()
        .captures(raw)
        .map(|caps| caps[1].to_lowercase())
        .unwrap_or_default()
}

fn is_plain_backtick_fence(raw: &str) -> bool {
    raw.starts_with("```") && !raw[3..].starts_with('`')
}

fn language_from_info(info: &str) -> String {
    info.split_whitespace()
        .next()
        .map(|word| {
            word.chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect::<String>()
                .to_lowercase()
        })
        .unwrap_or_default()
}

fn trim_code(code: &str) -> &str {
    let code = code.trim_end_matches([' ', '\t']);
    code.strip_suffix('\n').unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fence_extracts_tag_and_body() {
        let block = CodeBlock::from_fence("```html\n<b>hi</b>\n```");
        assert_eq!(block.language, "html");
        assert_eq!(block.body, "<b>hi</b>");
    }

    #[test]
    fn test_from_fence_lowercases_tag() {
        let block = CodeBlock::from_fence("```HTML\n<p>x</p>\n```");
        assert_eq!(block.language, "html");
        assert!(block.can_preview());
    }

    #[test]
    fn test_from_fence_without_tag() {
        let block = CodeBlock::from_fence("```\nplain text\n```");
        assert_eq!(block.language, "");
        assert_eq!(block.body, "plain text");
        assert!(!block.can_preview());
    }

    #[test]
    fn test_from_fence_keeps_inner_lines() {
        let block = CodeBlock::from_fence("```css\nh1 {\n  color: red;\n}\n```\n");
        assert_eq!(block.language, "css");
        assert_eq!(block.body, "h1 {\n  color: red;\n}");
    }

    #[test]
    fn test_preview_availability_by_tag() {
        for tag in ["html", "react", "css", "jsx", "tsx"] {
            let block = CodeBlock::from_fence(&format!("```{tag}\nx\n```"));
            assert!(block.can_preview(), "{tag} should offer a preview");
        }
        for tag in ["python", "rust", "javascript", "typescript", ""] {
            let block = CodeBlock::from_fence(&format!("```{tag}\nx\n```"));
            assert!(!block.can_preview(), "{tag:?} should not offer a preview");
        }
    }

    #[test]
    fn test_segment_message_splits_prose_and_code() {
        let text = "Here:\n```html\n<button>Click</button>\n```";
        let segments = segment_message(text);
        assert_eq!(
            segments,
            vec![
                Segment::Prose("Here:\n".to_string()),
                Segment::Code(CodeBlock::new("html", "<button>Click</button>")),
            ]
        );
    }

    #[test]
    fn test_segment_message_keeps_trailing_prose() {
        let text = "Before\n\n```python\nprint(1)\n```\n\nAfter `inline` code";
        let segments = segment_message(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[1],
            Segment::Code(CodeBlock::new("python", "print(1)"))
        );
        match &segments[2] {
            Segment::Prose(prose) => assert!(prose.contains("After `inline` code")),
            other => panic!("expected prose, got {other:?}"),
        }
    }

    #[test]
    fn test_segment_message_plain_text() {
        assert_eq!(
            segment_message("just words"),
            vec![Segment::Prose("just words".to_string())]
        );
        assert!(segment_message("   \n").is_empty());
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let blocks = code_blocks("look\n```jsx\n<div/>\n");
        assert_eq!(blocks, vec![CodeBlock::new("jsx", "<div/>")]);
    }

    #[test]
    fn test_tilde_fence_uses_info_string() {
        let blocks = code_blocks("~~~Tsx title\nconst a = 1;\n~~~\n");
        assert_eq!(blocks, vec![CodeBlock::new("tsx", "const a = 1;")]);
    }

    #[test]
    fn test_indented_block_has_no_tag() {
        let blocks = code_blocks("para\n\n    let x = 1;\n");
        assert_eq!(blocks, vec![CodeBlock::new("", "let x = 1;")]);
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let text = "```css\na{}\n```\n\ntext\n\n```react\n<App />\n```";
        let languages: Vec<String> = code_blocks(text).into_iter().map(|b| b.language).collect();
        assert_eq!(languages, vec!["css", "react"]);
    }

    #[test]
    fn test_fence_inside_list_item_drops_indentation() {
        let text = "1. Create the file:\n\n   ```python\n   def f():\n       return 1\n   ```\n";
        assert_eq!(
            code_blocks(text),
            vec![CodeBlock::new("python", "def f():\n    return 1")]
        );
    }

    #[test]
    fn test_fence_inside_blockquote_drops_markers() {
        let blocks = code_blocks("> ```html\n> <b>x</b>\n> ```\n");
        assert_eq!(blocks, vec![CodeBlock::new("html", "<b>x</b>")]);
        assert!(blocks[0].can_preview());
    }
}
