//! Rendering of model replies: Markdown to HTML, then math typesetting over
//! the HTML.
//!
//! Both stages sit behind traits so callers (and tests) can swap them. Only
//! model output goes through here; student text is shown as typed.

use latex2mathml::{latex_to_mathml, DisplayStyle};
use pulldown_cmark::{html, Event, Options, Parser};
use tracing::warn;

use crate::errors::RenderError;

/// Stage 1: Markdown source to an HTML fragment
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// Stage 2: replace `$…$` and `$$…$$` regions of an HTML fragment with
/// rendered notation
pub trait MathTypesetter: Send + Sync {
    fn typeset(&self, html: &str) -> Result<String, RenderError>;
}

/// GitHub-flavoured Markdown with every newline kept as a line break
#[derive(Debug, Default, Clone, Copy)]
pub struct PulldownMarkdown;

impl MarkdownConverter for PulldownMarkdown {
    fn to_html(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let events = Parser::new_ext(markdown, options).map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            // Raw HTML from the model is shown, never interpreted
            Event::Html(raw) => Event::Text(raw),
            other => other,
        });

        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, events);
        output
    }
}

/// TeX to MathML typesetting
#[derive(Debug, Default, Clone, Copy)]
pub struct MathMlTypesetter;

impl MathTypesetter for MathMlTypesetter {
    fn typeset(&self, html: &str) -> Result<String, RenderError> {
        let mut output = String::with_capacity(html.len());
        let mut run = String::new();
        let mut skip_depth = 0usize;

        for token in tokenize(html)? {
            match token {
                Token::Text(text) if skip_depth == 0 => run.push_str(text),
                Token::Tag(tag) if skip_depth == 0 && is_line_break(tag) => run.push(LINE_BREAK),
                Token::Text(text) => output.push_str(text),
                Token::Tag(tag) => {
                    flush_run(&mut run, &mut output);
                    if let Some((name, closing)) = tag_name(tag) {
                        if SKIPPED_ELEMENTS.contains(&name.as_str()) {
                            if closing {
                                skip_depth = skip_depth.saturating_sub(1);
                            } else {
                                skip_depth += 1;
                            }
                        }
                    }
                    output.push_str(tag);
                }
            }
        }
        flush_run(&mut run, &mut output);

        Ok(output)
    }
}

/// Two-stage renderer for model replies
pub struct ResponseRenderer {
    markdown: Box<dyn MarkdownConverter>,
    math: Box<dyn MathTypesetter>,
}

impl Default for ResponseRenderer {
    fn default() -> Self {
        Self::new(Box::new(PulldownMarkdown), Box::new(MathMlTypesetter))
    }
}

impl ResponseRenderer {
    pub fn new(markdown: Box<dyn MarkdownConverter>, math: Box<dyn MathTypesetter>) -> Self {
        Self { markdown, math }
    }

    /// Render a reply from scratch. When typesetting fails the Markdown
    /// HTML is returned as is.
    pub fn render(&self, markdown: &str) -> String {
        let html = self.markdown.to_html(markdown);

        match self.math.typeset(&html) {
            Ok(typeset) => typeset,
            Err(e) => {
                warn!(error = %e, "Math typesetting failed, showing Markdown only");
                html
            }
        }
    }
}

/// Stand-in for `<br>` inside a text run
const LINE_BREAK: char = '\u{0}';

/// Elements whose text is never scanned for math
const SKIPPED_ELEMENTS: [&str; 4] = ["code", "pre", "script", "style"];

enum Token<'a> {
    Tag(&'a str),
    Text(&'a str),
}

fn tokenize(html: &str) -> Result<Vec<Token<'_>>, RenderError> {
    let mut tokens = Vec::new();
    let mut rest = html;

    while !rest.is_empty() {
        if rest.starts_with('<') {
            let Some(end) = rest.find('>').map(|i| i + 1) else {
                let at = html.len() - rest.len();
                return Err(RenderError::Typesetting(format!("Unterminated tag at byte {}", at)));
            };
            tokens.push(Token::Tag(&rest[..end]));
            rest = &rest[end..];
        } else {
            let end = rest.find('<').unwrap_or(rest.len());
            tokens.push(Token::Text(&rest[..end]));
            rest = &rest[end..];
        }
    }

    Ok(tokens)
}

/// Lowercased element name and whether the tag closes it
fn tag_name(tag: &str) -> Option<(String, bool)> {
    let inner = tag.strip_prefix('<')?.trim_end_matches('>');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if name.is_empty() {
        None
    } else {
        Some((name.to_ascii_lowercase(), closing))
    }
}

fn is_line_break(tag: &str) -> bool {
    matches!(tag_name(tag), Some((name, false)) if name == "br")
}

/// Typeset one run of text and write it out
fn flush_run(run: &mut String, output: &mut String) {
    if run.is_empty() {
        return;
    }

    let mut rest = run.as_str();
    while let Some(start) = rest.find('$') {
        let (delimiter, style) = if rest[start..].starts_with("$$") {
            ("$$", DisplayStyle::Block)
        } else {
            ("$", DisplayStyle::Inline)
        };
        let body_start = start + delimiter.len();

        let Some(len) = rest[body_start..].find(delimiter) else {
            break;
        };
        let body = &rest[body_start..body_start + len];
        if body.trim().is_empty() {
            push_text(output, &rest[..body_start]);
            rest = &rest[body_start..];
            continue;
        }

        let end = body_start + len + delimiter.len();
        push_text(output, &rest[..start]);
        let tex = decode_entities(&body.replace(LINE_BREAK, "\n"));
        match latex_to_mathml(tex.trim(), style) {
            Ok(mathml) => output.push_str(&mathml),
            Err(e) => {
                // Only this formula stays as source
                warn!(tex = tex.trim(), error = %e, "Cannot typeset formula");
                push_text(output, &rest[start..end]);
            }
        }
        rest = &rest[end..];
    }
    push_text(output, rest);

    run.clear();
}

fn push_text(output: &mut String, text: &str) {
    for c in text.chars() {
        if c == LINE_BREAK {
            output.push_str("<br />");
        } else {
            output.push(c);
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FailingTypesetter;

    impl MathTypesetter for FailingTypesetter {
        fn typeset(&self, _html: &str) -> Result<String, RenderError> {
            Err(RenderError::Typesetting("boom".to_string()))
        }
    }

    /// Records that stage 2 only ever sees stage 1 output
    struct CountingTypesetter(Arc<AtomicUsize>);

    impl MathTypesetter for CountingTypesetter {
        fn typeset(&self, html: &str) -> Result<String, RenderError> {
            assert!(html.starts_with("<h3>"));
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(html.to_uppercase())
        }
    }

    #[test]
    fn test_markdown_keeps_line_breaks() {
        let html = PulldownMarkdown.to_html("Bước 1\nBước 2");

        assert_eq!(html, "<p>Bước 1<br />\nBước 2</p>\n");
    }

    #[test]
    fn test_markdown_tables_and_strikethrough() {
        let html = PulldownMarkdown.to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~sai~~");

        assert!(html.contains("<table>"));
        assert!(html.contains("<del>sai</del>"));
    }

    #[test]
    fn test_markdown_escapes_raw_html() {
        let html = PulldownMarkdown.to_html("<script>alert(1)</script>");

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_typeset_inline_and_block() {
        let html = MathMlTypesetter
            .typeset("<p>Ta có $x^2$ và</p>\n<p>$$ \\frac{1}{2} $$</p>")
            .unwrap();

        assert!(!html.contains('$'));
        assert_eq!(html.matches("<math").count(), 2);
        assert!(html.contains("display=\"block\""));
        assert!(html.starts_with("<p>Ta có <math"));
    }

    #[test]
    fn test_typeset_skips_code() {
        let source = "<pre><code>echo $HOME $PATH</code></pre>\n<p><code>$a$</code></p>";

        assert_eq!(MathMlTypesetter.typeset(source).unwrap(), source);
    }

    #[test]
    fn test_typeset_block_across_line_breaks() {
        let html = MathMlTypesetter
            .typeset("<p>$$<br />\nx + 1<br />\n$$</p>")
            .unwrap();

        assert!(html.starts_with("<p><math"));
        assert!(html.contains("display=\"block\""));
        assert!(!html.contains('$'));
    }

    #[test]
    fn test_typeset_leaves_unmatched_dollar() {
        let source = "<p>Giá 5$ một quyển</p>";

        assert_eq!(MathMlTypesetter.typeset(source).unwrap(), source);
    }

    #[test]
    fn test_typeset_keeps_good_regions_beside_bad_one() {
        let html = ResponseRenderer::default()
            .render("Nghiệm $x = 1$ và $y = 2$ của hệ $$\\begin{cases} x+y=3 \\end{cases}$$");

        assert_eq!(html.matches("<math").count(), 2);
        assert!(html.contains("$$\\begin{cases} x+y=3 \\end{cases}$$"));
    }

    #[test]
    fn test_typeset_rejects_unterminated_tag() {
        assert!(MathMlTypesetter.typeset("<p>$x$</p><em").is_err());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a &lt; b &amp;&amp; c &gt; d"), "a < b && c > d");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_render_runs_stages_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let renderer = ResponseRenderer::new(
            Box::new(PulldownMarkdown),
            Box::new(CountingTypesetter(calls.clone())),
        );

        let html = renderer.render("### Lời giải");
        assert_eq!(html, "<H3>LỜI GIẢI</H3>\n");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_render_falls_back_to_markdown() {
        let renderer = ResponseRenderer::new(Box::new(PulldownMarkdown), Box::new(FailingTypesetter));

        let html = renderer.render("**Kết luận:** $x = 1$");
        assert_eq!(html, "<p><strong>Kết luận:</strong> $x = 1$</p>\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let renderer = ResponseRenderer::default();
        let source = "### Phân tích\n\nPhương trình $x^2 - 1 = 0$ có nghiệm:\n$$x = \\pm 1$$";

        assert_eq!(renderer.render(source), renderer.render(source));
    }
}
