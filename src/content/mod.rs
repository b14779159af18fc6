//! Block-structured content rendering
//!
//! Blog posts arrive as lightly marked-up text. `parse_blocks` is a pure
//! function from raw text to a sequence of block nodes; rendering to the
//! terminal is a separate step so the parsing rules stay testable on their
//! own.
//!
//! Line rules: `## ` heading, `### ` subheading, consecutive `- ` lines one
//! bullet list, `> ` callout, anything else accumulates into a paragraph
//! until a blank line. Inline rules: `**bold**` and `[label](href)`.

/// One inline-formatted run of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Text(String),
    Bold(String),
    Link { label: String, href: String },
}

/// One block-level node.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading2(Vec<Span>),
    Heading3(Vec<Span>),
    BulletList(Vec<Vec<Span>>),
    Callout(Vec<Span>),
    Paragraph(Vec<Span>),
}

/// Split raw text into block nodes.
pub fn parse_blocks(raw: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut bullets: Vec<Vec<Span>> = Vec::new();

    fn flush_paragraph(paragraph: &mut Vec<String>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(parse_spans(&paragraph.join(" "))));
            paragraph.clear();
        }
    }

    fn flush_bullets(bullets: &mut Vec<Vec<Span>>, blocks: &mut Vec<Block>) {
        if !bullets.is_empty() {
            blocks.push(Block::BulletList(std::mem::take(bullets)));
        }
    }

    for line in raw.lines() {
        let trimmed = line.trim_end();

        if let Some(item) = trimmed.strip_prefix("- ") {
            flush_paragraph(&mut paragraph, &mut blocks);
            bullets.push(parse_spans(item));
            continue;
        }
        flush_bullets(&mut bullets, &mut blocks);

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if let Some(text) = trimmed.strip_prefix("### ") {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading3(parse_spans(text)));
        } else if let Some(text) = trimmed.strip_prefix("## ") {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading2(parse_spans(text)));
        } else if let Some(text) = trimmed.strip_prefix("> ") {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Callout(parse_spans(text)));
        } else {
            paragraph.push(trimmed.to_string());
        }
    }
    flush_bullets(&mut bullets, &mut blocks);
    flush_paragraph(&mut paragraph, &mut blocks);

    blocks
}

/// Split one line into inline spans.
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    fn flush(plain: &mut String, spans: &mut Vec<Span>) {
        if !plain.is_empty() {
            spans.push(Span::Text(std::mem::take(plain)));
        }
    }

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                flush(&mut plain, &mut spans);
                spans.push(Span::Bold(after[..end].to_string()));
                rest = &after[end + 2..];
                continue;
            }
        }

        if rest.starts_with('[') {
            if let Some(close) = rest.find(']') {
                let tail = &rest[close + 1..];
                if let Some(href_part) = tail.strip_prefix('(') {
                    if let Some(end) = href_part.find(')') {
                        flush(&mut plain, &mut spans);
                        spans.push(Span::Link {
                            label: rest[1..close].to_string(),
                            href: href_part[..end].to_string(),
                        });
                        rest = &href_part[end + 1..];
                        continue;
                    }
                }
            }
        }

        let ch = rest.chars().next().unwrap();
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    flush(&mut plain, &mut spans);

    spans
}

/// Render blocks as plain terminal text.
pub fn render_terminal(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading2(spans) => {
                let text = render_spans(spans);
                out.push_str(&format!("\n{}\n{}\n", text, "=".repeat(text.len())));
            }
            Block::Heading3(spans) => {
                let text = render_spans(spans);
                out.push_str(&format!("\n{}\n{}\n", text, "-".repeat(text.len())));
            }
            Block::BulletList(items) => {
                for item in items {
                    out.push_str(&format!("  - {}\n", render_spans(item)));
                }
            }
            Block::Callout(spans) => {
                out.push_str(&format!("  | {}\n", render_spans(spans)));
            }
            Block::Paragraph(spans) => {
                out.push_str(&format!("{}\n", render_spans(spans)));
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(text) => text.clone(),
            Span::Bold(text) => format!("*{}*", text),
            Span::Link { label, href } => format!("{} ({})", label, href),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Span {
        Span::Text(s.to_string())
    }

    #[test]
    fn test_headings() {
        let blocks = parse_blocks("## Pricing update\n### Fees");
        assert_eq!(
            blocks,
            vec![
                Block::Heading2(vec![text("Pricing update")]),
                Block::Heading3(vec![text("Fees")]),
            ]
        );
    }

    #[test]
    fn test_consecutive_bullets_form_one_list() {
        let blocks = parse_blocks("- one\n- two\n\n- three");
        assert_eq!(
            blocks,
            vec![
                Block::BulletList(vec![vec![text("one")], vec![text("two")]]),
                Block::BulletList(vec![vec![text("three")]]),
            ]
        );
    }

    #[test]
    fn test_paragraph_lines_join_until_blank() {
        let blocks = parse_blocks("first line\nsecond line\n\nnext paragraph");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![text("first line second line")]),
                Block::Paragraph(vec![text("next paragraph")]),
            ]
        );
    }

    #[test]
    fn test_callout() {
        let blocks = parse_blocks("> Payouts pause during maintenance.");
        assert_eq!(
            blocks,
            vec![Block::Callout(vec![text("Payouts pause during maintenance.")])]
        );
    }

    #[test]
    fn test_bold_inline() {
        let blocks = parse_blocks("fees are **zero** today");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("fees are "),
                Span::Bold("zero".into()),
                text(" today"),
            ])]
        );
    }

    #[test]
    fn test_link_inline() {
        let blocks = parse_blocks("see [the docs](https://discortize.com/docs) for more");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                text("see "),
                Span::Link {
                    label: "the docs".into(),
                    href: "https://discortize.com/docs".into(),
                },
                text(" for more"),
            ])]
        );
    }

    #[test]
    fn test_unterminated_markers_stay_plain() {
        let blocks = parse_blocks("a **dangling marker and [half a link](oops");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![text(
                "a **dangling marker and [half a link](oops"
            )])]
        );
    }

    #[test]
    fn test_bold_inside_heading_and_bullet() {
        let blocks = parse_blocks("## A **big** deal\n- **now** live");
        assert_eq!(
            blocks,
            vec![
                Block::Heading2(vec![text("A "), Span::Bold("big".into()), text(" deal")]),
                Block::BulletList(vec![vec![Span::Bold("now".into()), text(" live")]]),
            ]
        );
    }

    #[test]
    fn test_render_terminal_shapes() {
        let rendered = render_terminal(&parse_blocks("## Title\n- a\n> note\nbody"));
        assert!(rendered.contains("Title\n====="));
        assert!(rendered.contains("  - a"));
        assert!(rendered.contains("  | note"));
        assert!(rendered.contains("body"));
    }
}
