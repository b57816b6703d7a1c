//! Previews for HTML, React and CSS code blocks
//!
//! A preview is markup shown inside a bordered container. It is never
//! executed in the host document: [`Preview::document`] wraps it in a
//! sandboxed `<iframe srcdoc>` with scripts disabled, and the React preview
//! is only a raw-markup approximation, not JSX evaluation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::code_block::CodeBlock;

pub const DIRECT_RENDER_ERROR: &str = "Direct render calls are not supported in preview";

/// Fixed fragment the CSS preview styles.
pub const CSS_SAMPLE_HTML: &str = r#"<div class="css-preview-box">
  <div class="css-preview-content">
    <h1>Sample Content</h1>
    <p>This is a paragraph to preview CSS styles.</p>
    <button>Button</button>
  </div>
</div>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Html,
    React,
    Css,
}

impl PreviewKind {
    /// Preview kind for a lower-cased language tag.
    pub fn for_language(tag: &str) -> Option<Self> {
        match tag {
            "html" => Some(PreviewKind::Html),
            "react" | "jsx" | "tsx" => Some(PreviewKind::React),
            "css" => Some(PreviewKind::Css),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PreviewKind::Html => "HTML",
            PreviewKind::React => "React",
            PreviewKind::Css => "CSS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Markup to place inside the bordered container
    Markup(String),
    /// The block cannot be previewed; shown in place of the container
    Error(String),
}

impl Preview {
    /// Standalone HTML page with the preview isolated in a sandboxed frame.
    pub fn document(&self) -> String {
        let body = match self {
            Preview::Markup(markup) => format!(
                "<div class=\"preview-frame\"><iframe sandbox=\"\" referrerpolicy=\"no-referrer\" srcdoc=\"{}\"></iframe></div>",
                escape_html(markup)
            ),
            Preview::Error(message) => {
                format!("<div class=\"preview-error\">Error: {}</div>", escape_html(message))
            }
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; style-src 'unsafe-inline'; img-src data:">
<title>Preview</title>
<style>
.preview-label {{ color: #9ca3af; font: 14px sans-serif; margin-bottom: 8px; }}
.preview-frame {{ border: 2px solid #4b5563; border-radius: 8px; padding: 16px; background: #fff; }}
.preview-frame iframe {{ border: 0; width: 100%; min-height: 320px; }}
.preview-error {{ color: #ef4444; font: 14px sans-serif; }}
</style>
</head>
<body>
<div class="preview-label">Preview:</div>
{body}
</body>
</html>
"#
        )
    }
}

/// Build the preview for `block`, or `None` when its tag has no preview.
pub fn render_preview(block: &CodeBlock) -> Option<Preview> {
    let preview = match block.preview_kind()? {
        PreviewKind::Html => Preview::Markup(block.body.clone()),
        PreviewKind::React => {
            if block.body.contains("render(") || block.body.contains("ReactDOM.render(") {
                Preview::Error(DIRECT_RENDER_ERROR.to_string())
            } else {
                Preview::Markup(block.body.clone())
            }
        }
        PreviewKind::Css => {
            Preview::Markup(format!("<style>\n{}\n</style>\n{}", block.body, CSS_SAMPLE_HTML))
        }
    };
    Some(preview)
}

/// Write the sandboxed preview page for message `index` under `dir`.
pub fn write_document(dir: &Path, index: usize, preview: &Preview) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create preview directory {}", dir.display()))?;

    let path = dir.join(format!("preview-{index}.html"));
    fs::write(&path, preview.document())
        .with_context(|| format!("Could not write preview {}", path.display()))?;
    Ok(path)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_html_preview_is_the_body() {
        let block = CodeBlock::new("html", "<button>Click</button>");
        assert_eq!(
            render_preview(&block),
            Some(Preview::Markup("<button>Click</button>".to_string()))
        );
    }

    #[test]
    fn test_react_preview_rejects_render_calls() {
        for body in [
            "ReactDOM.render(<App />, root)",
            "render(<App />)",
            "root.render(<App />)",
        ] {
            let block = CodeBlock::new("react", body);
            assert_eq!(
                render_preview(&block),
                Some(Preview::Error(DIRECT_RENDER_ERROR.to_string())),
                "{body}"
            );
        }
    }

    #[test]
    fn test_jsx_and_tsx_share_react_preview() {
        let jsx = CodeBlock::new("jsx", "<div>Hello</div>");
        let tsx = CodeBlock::new("tsx", "<div>Hello</div>");
        assert_eq!(render_preview(&jsx), render_preview(&tsx));
        assert_eq!(
            render_preview(&jsx),
            Some(Preview::Markup("<div>Hello</div>".to_string()))
        );
    }

    #[test]
    fn test_css_preview_styles_sample_fragment() {
        let block = CodeBlock::new("css", "button { color: red; }");
        let Some(Preview::Markup(markup)) = render_preview(&block) else {
            panic!("css should preview as markup");
        };
        assert!(markup.starts_with("<style>\nbutton { color: red; }\n</style>"));
        assert!(markup.contains("<h1>Sample Content</h1>"));
        assert!(markup.contains("<p>This is a paragraph to preview CSS styles.</p>"));
        assert!(markup.contains("<button>Button</button>"));
    }

    #[test]
    fn test_no_preview_for_other_languages() {
        assert_eq!(render_preview(&CodeBlock::new("python", "print(1)")), None);
        assert_eq!(render_preview(&CodeBlock::new("", "<b>x</b>")), None);
    }

    #[test]
    fn test_document_sandboxes_markup() {
        let doc = Preview::Markup("<button onclick=\"x()\">Click</button>".to_string()).document();
        assert!(doc.contains("<iframe sandbox=\"\""));
        assert!(doc.contains("srcdoc=\"&lt;button onclick=&quot;x()&quot;&gt;Click&lt;/button&gt;\""));
        assert!(!doc.contains("<button"));
    }

    #[test]
    fn test_document_for_error_has_no_frame() {
        let doc = Preview::Error(DIRECT_RENDER_ERROR.to_string()).document();
        assert!(doc.contains("Error: Direct render calls are not supported in preview"));
        assert!(!doc.contains("<iframe"));
    }

    #[test]
    fn test_write_document() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("previews");
        let preview = Preview::Markup("<b>hi</b>".to_string());

        let path = write_document(&target, 3, &preview).unwrap();

        assert_eq!(path, target.join("preview-3.html"));
        assert_eq!(fs::read_to_string(&path).unwrap(), preview.document());
    }
}
