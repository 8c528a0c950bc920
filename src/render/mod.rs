//! Display rendering for articles.
//!
//! Understands a deliberately small markdown subset:
//!
//! * `# `, `## `, `### ` at the start of a line open a level 1-3 heading that spans that line
//! * `**text**` is bold, in headings and paragraphs alike
//! * blank lines separate paragraphs; other lines of a paragraph are joined with `\n`
//!
//! Lines are classified first and bold spans are parsed afterwards within each block's text, so
//! a heading line never ends up inside a paragraph. Anything else, including unmatched `**`,
//! is kept as literal text. The resulting [`Document`] is for display only.

use serde::Serialize;

pub mod html;
pub mod terminal;

/// Rendered article
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "text", rename_all = "snake_case")]
pub enum Inline {
    Text(String),
    Bold(String),
}

impl Document {
    pub fn headings(&self) -> impl Iterator<Item = (u8, String)> + '_ {
        self.blocks.iter().filter_map(|b| match b {
            Block::Heading { level, content } => Some((*level, plain_text(content))),
            Block::Paragraph { .. } => None,
        })
    }

    pub fn to_html(&self) -> String {
        html::to_html(self)
    }

    pub fn to_terminal(&self) -> String {
        terminal::to_terminal(self)
    }
}

/// Concatenated text of inline content without markup
pub fn plain_text(content: &[Inline]) -> String {
    content
        .iter()
        .map(|i| match i {
            Inline::Text(t) | Inline::Bold(t) => t.as_str(),
        })
        .collect()
}

/// Parse article markdown into a [`Document`]
pub fn render(text: &str) -> Document {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut blocks);
        } else if let Some((level, rest)) = heading(line) {
            flush(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level,
                content: parse_inline(rest.trim_end()),
            });
        } else {
            paragraph.push(line);
        }
    }
    flush(&mut paragraph, &mut blocks);

    Document { blocks }
}

fn flush(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph {
            content: parse_inline(&paragraph.join("\n")),
        });
        paragraph.clear();
    }
}

fn heading(line: &str) -> Option<(u8, &str)> {
    [("### ", 3), ("## ", 2), ("# ", 1)]
        .into_iter()
        .find_map(|(marker, level)| line.strip_prefix(marker).map(|rest| (level, rest)))
}

/// Split text into plain and bold runs. A bold run is `**` + at least one non-`*` char + `**`.
fn parse_inline(text: &str) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let inner_len = after.find('*').unwrap_or(after.len());

        if inner_len > 0 && after[inner_len..].starts_with("**") {
            literal.push_str(&rest[..start]);
            if !literal.is_empty() {
                out.push(Inline::Text(std::mem::take(&mut literal)));
            }
            out.push(Inline::Bold(after[..inner_len].to_string()));
            rest = &after[inner_len + 2..];
        } else {
            // Not a bold span here; keep one `*` literally and look again from the next char
            literal.push_str(&rest[..start + 1]);
            rest = &rest[start + 1..];
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        out.push(Inline::Text(literal));
    }
    out
}
