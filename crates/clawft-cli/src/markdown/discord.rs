//! Markdown to Discord format converter.
//!
//! Discord uses standard Markdown for message formatting, so the
//! conversion is mostly a passthrough. This converter ensures code
//! blocks and spoilers are preserved correctly.
//!
//! See <https://support.discord.com/hc/en-us/articles/210298617>.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::MarkdownConverter;

/// Converts CommonMark to Discord-compatible Markdown (mostly passthrough).
pub struct DiscordMarkdownConverter;

impl MarkdownConverter for DiscordMarkdownConverter {
    fn convert(&self, markdown: &str) -> String {
        let options = Options::all();
        let parser = Parser::new_ext(markdown, options);
        let mut output = String::with_capacity(markdown.len());
        // Stack for link destination URLs so we can emit `](url)` at End(Link).
        let mut link_stack: Vec<String> = Vec::new();

        for event in parser {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Strong => output.push_str("**"),
                    Tag::Emphasis => output.push('*'),
                    Tag::CodeBlock(_) => output.push_str("```\n"),
                    Tag::Link { dest_url, .. } => {
                        output.push('[');
                        link_stack.push(dest_url.to_string());
                    }
                    Tag::Paragraph => {}
                    Tag::Heading { level, .. } => {
                        for _ in 0..level_to_u8(level) {
                            output.push('#');
                        }
                        output.push(' ');
                    }
                    Tag::List(_) => {}
                    Tag::Item => output.push_str("- "),
                    Tag::BlockQuote(_) => output.push_str("> "),
                    Tag::Strikethrough => output.push_str("~~"),
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Strong => output.push_str("**"),
                    TagEnd::Emphasis => output.push('*'),
                    TagEnd::CodeBlock => output.push_str("```\n"),
                    TagEnd::Link => {
                        if let Some(url) = link_stack.pop() {
                            output.push_str("](");
                            output.push_str(&url);
                            output.push(')');
                        } else {
                            output.push(']');
                        }
                    }
                    TagEnd::Paragraph => output.push('\n'),
                    TagEnd::Heading(_) => output.push('\n'),
                    TagEnd::Item => output.push('\n'),
                    TagEnd::Strikethrough => output.push_str("~~"),
                    _ => {}
                },
                Event::Text(text) => {
                    output.push_str(&text);
                }
                Event::Code(code) => {
                    output.push('`');
                    output.push_str(&code);
                    output.push('`');
                }
                Event::SoftBreak | Event::HardBreak => {
                    output.push('\n');
                }
                _ => {}
            }
        }

        output.trim_end().to_owned()
    }
}

/// Convert a pulldown-cmark `HeadingLevel` to a `u8`.
fn level_to_u8(level: pulldown_cmark::HeadingLevel) -> u8 {
    match level {
        pulldown_cmark::HeadingLevel::H1 => 1,
        pulldown_cmark::HeadingLevel::H2 => 2,
        pulldown_cmark::HeadingLevel::H3 => 3,
        pulldown_cmark::HeadingLevel::H4 => 4,
        pulldown_cmark::HeadingLevel::H5 => 5,
        pulldown_cmark::HeadingLevel::H6 => 6,
    }
}
