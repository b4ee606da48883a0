use colored::*;
use mathtutor_core::{Message, Role};
use pulldown_cmark::{Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};

/// Print one conversation message to the terminal
pub fn print_message(message: &Message) {
    match message.role {
        Role::User => {
            let attachment = if message.has_image() { " [ảnh]" } else { "" };
            println!("{}{}: {}", "Bạn".green().bold(), attachment.dimmed(), message.text);
        }
        Role::Model if message.is_error => {
            println!("{}: {}", "Gia sư".blue().bold(), message.text.red());
        }
        Role::Model => {
            println!("{}: {}", "Gia sư".blue().bold(), render_markdown(&message.text));
        }
    }
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "mathtutor \"your question\" [--image FILE]".green().bold());
    println!("    Ask a single question, optionally with a photo of the exercise");
    println!();
    println!("  {}", "mathtutor -i".green().bold());
    println!("    Start an interactive tutoring session");
    println!();
    print_chat_commands();
}

/// Commands understood by the interactive loop
pub fn print_chat_commands() {
    println!("{}", "Chat commands:".cyan());
    println!("  /image <FILE> [question]  Send a photo of an exercise");
    println!("  /clear                    Clear the conversation");
    println!("  exit | quit               Leave the session");
    println!();
}

/// Render a Markdown reply for the terminal. Math is left in its `$…$` form
/// and highlighted.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut output = String::new();
    let mut in_code_block = false;
    let mut strong = false;
    let mut list_depth = 0usize;

    for event in MdParser::new_ext(markdown, options) {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => {
                let marker = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => "##",
                    _ => "#",
                };
                output.push_str(&format!("\n{} ", marker.bright_cyan().bold()));
                strong = true;
            }
            MdEvent::End(Tag::Heading(..)) => {
                strong = false;
                output.push('\n');
            }
            MdEvent::Start(Tag::Paragraph) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::End(Tag::Paragraph) => output.push('\n'),
            MdEvent::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                output.push('\n');
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                in_code_block = false;
                output.push('\n');
            }
            MdEvent::Start(Tag::List(_)) => {
                list_depth += 1;
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::End(Tag::List(_)) => list_depth = list_depth.saturating_sub(1),
            MdEvent::Start(Tag::Item) => {
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                output.push_str(&format!("{}{}  ", indent, "•".yellow()));
            }
            MdEvent::End(Tag::Item) => {
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::Strong) => strong = true,
            MdEvent::End(Tag::Strong) => strong = false,
            MdEvent::Code(code) => {
                output.push_str(&format!("`{}`", code).on_bright_black().white().to_string());
            }
            MdEvent::Text(text) if in_code_block => output.push_str(&text.dimmed().to_string()),
            MdEvent::Text(text) => {
                let text = highlight_math(&text);
                if strong {
                    output.push_str(&text.bold().to_string());
                } else {
                    output.push_str(&text);
                }
            }
            MdEvent::Html(html) => output.push_str(&html),
            MdEvent::SoftBreak | MdEvent::HardBreak => output.push('\n'),
            MdEvent::TaskListMarker(done) => output.push_str(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    output.trim_end().to_string()
}

/// Colour `$…$` and `$$…$$` regions so formulas stand out
fn highlight_math(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('$') {
        let delimiter = if rest[start..].starts_with("$$") { "$$" } else { "$" };
        let body_start = start + delimiter.len();
        let Some(len) = rest[body_start..].find(delimiter) else {
            break;
        };
        let end = body_start + len + delimiter.len();

        output.push_str(&rest[..start]);
        output.push_str(&rest[start..end].magenta().to_string());
        rest = &rest[end..];
    }
    output.push_str(rest);

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_plain() {
        colored::control::set_override(false);

        let rendered = render_markdown("### Lời giải\n\n- Bước 1: $x^2 = 1$\n- Bước 2: **kết luận**");

        assert_eq!(
            rendered,
            "\n# Lời giải\n•  Bước 1: $x^2 = 1$\n•  Bước 2: kết luận"
        );
    }

    #[test]
    fn test_highlight_math_keeps_text() {
        colored::control::set_override(false);

        assert_eq!(highlight_math("a $x$ b $$y$$ c $"), "a $x$ b $$y$$ c $");
    }
}
