use super::{Block, Document, Inline};

fn escape(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>\n"),
            c => out.push(c),
        }
    }
}

fn inlines(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text(t) => escape(t, out),
            Inline::Bold(t) => {
                out.push_str("<strong>");
                escape(t, out);
                out.push_str("</strong>");
            }
        }
    }
}

/// HTML fragment, one element per block
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    for block in &doc.blocks {
        match block {
            Block::Heading { level, content } => {
                out.push_str(&format!("<h{level}>"));
                inlines(content, &mut out);
                out.push_str(&format!("</h{level}>\n"));
            }
            Block::Paragraph { content } => {
                out.push_str("<p>");
                inlines(content, &mut out);
                out.push_str("</p>\n");
            }
        }
    }
    out
}
