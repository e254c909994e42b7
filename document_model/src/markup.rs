//! Read-only projections of a document: HTML markup and plain text
//!
//! The markup is what export and clipboard collaborators consume. It is a
//! pure function of the document; nothing is ever parsed back from it.

use std::fmt::Write;

use crate::block::{Alignment, Block, BlockKind, Inline, TextBlock, TextRun};
use crate::document::Document;
use crate::object::{EmbeddedObject, Image, ObjectContent, Table};

/// Renders the whole document as an HTML fragment.
pub fn to_markup(document: &Document) -> String {
    let mut out = String::new();
    write_blocks(&mut out, document.blocks());
    out
}

/// Plain text: one line per block, table cells separated by tabs.
pub fn to_plain_text(document: &Document) -> String {
    document.plain_text()
}

fn write_blocks(out: &mut String, blocks: &[Block]) {
    let mut ix = 0;
    while ix < blocks.len() {
        match &blocks[ix] {
            Block::Text(text) => match text.format.kind {
                BlockKind::ListItem { ordered } => {
                    let tag = if ordered { "ol" } else { "ul" };
                    out.push_str(&format!("<{tag}>"));
                    while let Some(Block::Text(item)) = blocks.get(ix) {
                        if item.format.kind != (BlockKind::ListItem { ordered }) {
                            break;
                        }
                        write_text_block(out, item, "li");
                        ix += 1;
                    }
                    out.push_str(&format!("</{tag}>"));
                    continue;
                }
                BlockKind::Heading { level } => {
                    let tag = format!("h{}", level.clamp(1, 6));
                    write_text_block(out, text, &tag);
                }
                BlockKind::Paragraph => write_text_block(out, text, "p"),
            },
            Block::Object(object) => write_object(out, object),
        }
        ix += 1;
    }
}

fn block_style(text: &TextBlock) -> String {
    let mut rules = Vec::new();
    if text.format.align != Alignment::Left {
        rules.push(format!("text-align:{}", text.format.align.as_str()));
    }
    if text.format.indent > 0 {
        rules.push(format!("margin-left:{}px", u32::from(text.format.indent) * 40));
    }
    if rules.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", rules.join(";"))
    }
}

fn write_text_block(out: &mut String, text: &TextBlock, tag: &str) {
    let _ = write!(out, "<{}{}>", tag, block_style(text));
    if text.is_empty() {
        out.push_str("<br>");
    }
    for inline in &text.inlines {
        match inline {
            Inline::Text(run) => write_run(out, run),
            Inline::Object(object) => write_object(out, object),
        }
    }
    let _ = write!(out, "</{}>", tag);
}

fn write_run(out: &mut String, run: &TextRun) {
    if run.text.is_empty() {
        return;
    }
    let style = &run.style;
    let mut closers: Vec<&str> = Vec::new();

    if let Some(href) = &style.link {
        let _ = write!(out, "<a href=\"{}\">", escape(href));
        closers.push("</a>");
    }
    for (on, open, close) in [
        (style.bold, "<b>", "</b>"),
        (style.italic, "<i>", "</i>"),
        (style.underline, "<u>", "</u>"),
        (style.strikethrough, "<s>", "</s>"),
    ] {
        if on {
            out.push_str(open);
            closers.push(close);
        }
    }
    if let Some(size) = style.size {
        let _ = write!(out, "<font size=\"{}\">", size.ordinal());
        closers.push("</font>");
    }

    let mut rules = Vec::new();
    if let Some(color) = &style.color {
        rules.push(format!("color:{}", escape(color.as_str())));
    }
    if let Some(color) = &style.highlight {
        rules.push(format!("background-color:{}", escape(color.as_str())));
    }
    if let Some(font) = &style.font {
        rules.push(format!("font-family:{}", escape(font)));
    }
    if !rules.is_empty() {
        let _ = write!(out, "<span style=\"{}\">", rules.join(";"));
        closers.push("</span>");
    }

    out.push_str(&escape(&run.text));
    for close in closers.iter().rev() {
        out.push_str(close);
    }
}

fn write_object(out: &mut String, object: &EmbeddedObject) {
    match &object.content {
        ObjectContent::Image(image) => write_image(out, image),
        ObjectContent::Table(table) => write_table(out, table),
    }
}

fn write_image(out: &mut String, image: &Image) {
    let _ = write!(
        out,
        "<img src=\"{}\" width=\"{}\" height=\"{}\" alt=\"\">",
        escape(&image.source),
        image.display_width,
        image.display_height
    );
}

fn write_table(out: &mut String, table: &Table) {
    out.push_str("<table><tbody>");
    for row in table.rows() {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            write_blocks(out, &cell.blocks);
            out.push_str("</td>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockFormat;
    use crate::position::{Position, TextRange};
    use crate::style::{Color, FontSize};

    #[test]
    fn test_empty_document_markup() {
        assert_eq!(to_markup(&Document::new()), "<p><br></p>");
    }

    #[test]
    fn test_escapes_text() {
        let doc = Document::from_plain_text("a < b & \"c\"");
        assert_eq!(to_markup(&doc), "<p>a &lt; b &amp; &quot;c&quot;</p>");
    }

    #[test]
    fn test_inline_styles() {
        let mut doc = Document::from_plain_text("hi there");
        let range = TextRange::new(Position::new(0, 0), Position::new(0, 2));
        doc.update_style(range, |style| {
            style.bold = true;
            style.size = Some(FontSize::from_px(24));
            style.color = Color::parse("#f00");
            style.link = Some("https://x.test".into());
        })
        .unwrap();
        assert_eq!(
            to_markup(&doc),
            "<p><a href=\"https://x.test\"><b><font size=\"5\"><span style=\"color:#ff0000\">hi</span></font></b></a> there</p>"
        );
    }

    #[test]
    fn test_lists_grouped() {
        let mut doc = Document::from_plain_text("one\ntwo\nafter");
        let range = TextRange::new(Position::new(0, 0), Position::new(1, 0));
        doc.update_format(range, |format| {
            format.kind = BlockKind::ListItem { ordered: true }
        })
        .unwrap();
        assert_eq!(
            to_markup(&doc),
            "<ol><li>one</li><li>two</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_heading_alignment_and_indent() {
        let doc = Document::from_blocks(vec![Block::Text(TextBlock::from_text(
            BlockFormat {
                kind: BlockKind::Heading { level: 2 },
                align: Alignment::Center,
                indent: 1,
            },
            "T",
        ))]);
        assert_eq!(
            to_markup(&doc),
            "<h2 style=\"text-align:center;margin-left:40px\">T</h2>"
        );
    }

    #[test]
    fn test_table_markup() {
        let mut doc = Document::new();
        doc.insert_block_object(Position::zero(), EmbeddedObject::table(Table::new(1, 2)))
            .unwrap();
        assert_eq!(
            to_markup(&doc),
            "<table><tbody><tr><td><p><br></p></td><td><p><br></p></td></tr></tbody></table><p><br></p>"
        );
    }

    #[test]
    fn test_plain_text_skips_images() {
        let mut doc = Document::from_plain_text("ab");
        let image = EmbeddedObject::image(Image {
            source: "data:image/png;base64,AA==".into(),
            mime: "image/png".into(),
            display_width: 1,
            display_height: 1,
        });
        doc.insert_inline_object(Position::new(0, 1), image).unwrap();
        assert_eq!(to_plain_text(&doc), "ab");
        assert!(to_markup(&doc).contains("<img src=\"data:image/png;base64,AA==\""));
    }
}
