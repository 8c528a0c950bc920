use console::style;

use super::{Block, Document, Inline};

fn inlines(content: &[Inline], emphasize_all: bool) -> String {
    content
        .iter()
        .map(|inline| match inline {
            Inline::Text(t) if emphasize_all => style(t).bold().to_string(),
            Inline::Text(t) => t.clone(),
            Inline::Bold(t) => style(t).bold().to_string(),
        })
        .collect()
}

/// Styled text for a terminal. Styling is dropped automatically when stdout is not a tty.
pub fn to_terminal(doc: &Document) -> String {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level: 1, content } => {
                style(inlines(content, true)).cyan().underlined().to_string()
            }
            Block::Heading { level: 2, content } => style(inlines(content, true)).cyan().to_string(),
            Block::Heading { content, .. } => inlines(content, true),
            Block::Paragraph { content } => inlines(content, false),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
