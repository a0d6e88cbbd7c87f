//! Markdown to Slack mrkdwn converter.
//!
//! Slack uses its own markup format called `mrkdwn`:
//! - Bold: `*text*`
//! - Italic: `_text_`
//! - Code: `` `text` ``
//! - Code block: `` ```text``` ``
//! - Link: `<url|text>`
//!
//! See <https://api.slack.com/reference/surfaces/formatting>.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use super::MarkdownConverter;

/// Converts CommonMark to Slack mrkdwn format.
pub struct SlackMarkdownConverter;

impl MarkdownConverter for SlackMarkdownConverter {
    fn convert(&self, markdown: &str) -> String {
        let options = Options::all();
        let parser = Parser::new_ext(markdown, options);
        let mut output = String::with_capacity(markdown.len());
        let mut in_code_block = false;

        for event in parser {
            match event {
                Event::Start(tag) => match tag {
                    Tag::Strong => output.push('*'),
                    Tag::Emphasis => output.push('_'),
                    Tag::CodeBlock(_) => {
                        output.push_str("```\n");
                        in_code_block = true;
                    }
                    Tag::Link { dest_url, .. } => {
                        output.push('<');
                        output.push_str(&dest_url);
                        output.push('|');
                    }
                    Tag::Paragraph => {}
                    Tag::Heading { .. } => output.push('*'),
                    Tag::List(_) => {}
                    Tag::Item => output.push_str("- "),
                    Tag::BlockQuote(_) => output.push_str("> "),
                    Tag::Strikethrough => output.push('~'),
                    _ => {}
                },
                Event::End(tag_end) => match tag_end {
                    TagEnd::Strong => output.push('*'),
                    TagEnd::Emphasis => output.push('_'),
                    TagEnd::CodeBlock => {
                        output.push_str("```\n");
                        in_code_block = false;
                    }
                    TagEnd::Link => output.push('>'),
                    TagEnd::Paragraph => output.push('\n'),
                    TagEnd::Heading(_) => {
                        output.push('*');
                        output.push('\n');
                    }
                    TagEnd::Item => output.push('\n'),
                    TagEnd::Strikethrough => output.push('~'),
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
                    if !in_code_block {
                        output.push('\n');
                    }
                }
                _ => {}
            }
        }

        output.trim_end().to_owned()
    }
}
