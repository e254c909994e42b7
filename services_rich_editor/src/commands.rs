//! Formatting commands and their execution

use document_model::{
    Alignment, BlockKind, Color, Document, FontSize, InlineFlag, InlineStyle, TextRange,
    MAX_INDENT,
};
use thiserror::Error;

use crate::error::{EditorError, EditorResult};

/// Toolbar intent parsing error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {0} needs a value")]
    MissingValue(String),

    #[error("Invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Formatting command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    Indent,
    Outdent,
    OrderedList,
    UnorderedList,
    FontName(String),
    /// Pixel size, mapped to the nearest ordinal
    FontSize(u32),
    /// 1..=6, or 0 for a plain paragraph
    Heading(u8),
    TextColor(String),
    HighlightColor(String),
    CreateLink(String),
    RemoveFormatting,
    Unlink,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Bold => "bold",
            CommandKind::Italic => "italic",
            CommandKind::Underline => "underline",
            CommandKind::Strikethrough => "strikethrough",
            CommandKind::JustifyLeft => "justify-left",
            CommandKind::JustifyCenter => "justify-center",
            CommandKind::JustifyRight => "justify-right",
            CommandKind::Indent => "indent",
            CommandKind::Outdent => "outdent",
            CommandKind::OrderedList => "ordered-list",
            CommandKind::UnorderedList => "unordered-list",
            CommandKind::FontName(_) => "font-name",
            CommandKind::FontSize(_) => "font-size",
            CommandKind::Heading(_) => "heading",
            CommandKind::TextColor(_) => "text-color",
            CommandKind::HighlightColor(_) => "highlight-color",
            CommandKind::CreateLink(_) => "create-link",
            CommandKind::RemoveFormatting => "remove-formatting",
            CommandKind::Unlink => "unlink",
        }
    }

    /// Parses a toolbar intent: a command name plus its optional value.
    ///
    /// Heading values accept `h1`..`h6`, `p`, or a bare level.
    pub fn parse(action: &str, value: Option<&str>) -> Result<Self, CommandError> {
        let action = action.trim();
        let required = || {
            value
                .map(str::trim)
                .ok_or_else(|| CommandError::MissingValue(action.to_string()))
        };

        let command = match action {
            "bold" => CommandKind::Bold,
            "italic" => CommandKind::Italic,
            "underline" => CommandKind::Underline,
            "strikethrough" => CommandKind::Strikethrough,
            "justify-left" | "align-left" => CommandKind::JustifyLeft,
            "justify-center" | "align-center" => CommandKind::JustifyCenter,
            "justify-right" | "align-right" => CommandKind::JustifyRight,
            "indent" => CommandKind::Indent,
            "outdent" => CommandKind::Outdent,
            "ordered-list" | "olist" => CommandKind::OrderedList,
            "unordered-list" | "ulist" => CommandKind::UnorderedList,
            "font-name" => CommandKind::FontName(required()?.to_string()),
            "font-size" => {
                let raw = required()?;
                let digits = raw.strip_suffix("px").unwrap_or(raw);
                let px = digits
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| CommandError::InvalidSyntax(raw.to_string()))?;
                CommandKind::FontSize(px)
            }
            "heading" => {
                let raw = required()?;
                let level = match raw {
                    "p" => 0,
                    other => other
                        .strip_prefix('h')
                        .unwrap_or(other)
                        .parse::<u8>()
                        .map_err(|_| CommandError::InvalidSyntax(raw.to_string()))?,
                };
                CommandKind::Heading(level)
            }
            "text-color" => CommandKind::TextColor(required()?.to_string()),
            "highlight-color" => CommandKind::HighlightColor(required()?.to_string()),
            "create-link" => CommandKind::CreateLink(required()?.to_string()),
            "remove-formatting" => CommandKind::RemoveFormatting,
            "unlink" => CommandKind::Unlink,
            "" => return Err(CommandError::InvalidSyntax("Empty command".to_string())),
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Inline attribute change carried by a command
enum StyleEdit {
    Toggle(InlineFlag),
    Font(String),
    Size(FontSize),
    Color(Color),
    Highlight(Color),
    Clear,
}

impl StyleEdit {
    fn apply(&self, style: &mut InlineStyle, flag_on: bool) {
        match self {
            StyleEdit::Toggle(flag) => style.set_flag(*flag, flag_on),
            StyleEdit::Font(name) => style.font = Some(name.clone()),
            StyleEdit::Size(size) => style.size = Some(*size),
            StyleEdit::Color(color) => style.color = Some(color.clone()),
            StyleEdit::Highlight(color) => style.highlight = Some(color.clone()),
            StyleEdit::Clear => *style = InlineStyle::default(),
        }
    }
}

/// What applying a command changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The document was edited
    Applied,
    /// Only the style for the next typed text changed
    TypingStyle(InlineStyle),
}

fn parse_color(raw: &str) -> EditorResult<Color> {
    Color::parse(raw).ok_or_else(|| EditorError::InvalidValue(format!("color {:?}", raw)))
}

/// Applies `command` to `range`.
///
/// `typing` is the style the next typed character would take at a
/// collapsed caret; inline commands on a collapsed range edit that instead
/// of the document. Values are validated before anything is touched.
pub fn execute(
    command: &CommandKind,
    document: &mut Document,
    range: TextRange,
    typing: &InlineStyle,
) -> EditorResult<CommandOutcome> {
    document.validate_range(range)?;

    let edit = match command {
        CommandKind::Bold => StyleEdit::Toggle(InlineFlag::Bold),
        CommandKind::Italic => StyleEdit::Toggle(InlineFlag::Italic),
        CommandKind::Underline => StyleEdit::Toggle(InlineFlag::Underline),
        CommandKind::Strikethrough => StyleEdit::Toggle(InlineFlag::Strikethrough),
        CommandKind::FontName(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(EditorError::InvalidValue("empty font name".into()));
            }
            StyleEdit::Font(name.to_string())
        }
        CommandKind::FontSize(px) => StyleEdit::Size(FontSize::from_px(*px)),
        CommandKind::TextColor(raw) => StyleEdit::Color(parse_color(raw)?),
        CommandKind::HighlightColor(raw) => StyleEdit::Highlight(parse_color(raw)?),
        CommandKind::RemoveFormatting => StyleEdit::Clear,

        CommandKind::JustifyLeft => return align(document, range, Alignment::Left),
        CommandKind::JustifyCenter => return align(document, range, Alignment::Center),
        CommandKind::JustifyRight => return align(document, range, Alignment::Right),
        CommandKind::Indent => {
            document.update_format(range, |format| {
                format.indent = (format.indent + 1).min(MAX_INDENT)
            })?;
            return Ok(CommandOutcome::Applied);
        }
        CommandKind::Outdent => {
            document.update_format(range, |format| {
                format.indent = format.indent.saturating_sub(1)
            })?;
            return Ok(CommandOutcome::Applied);
        }
        CommandKind::OrderedList => return toggle_list(document, range, true),
        CommandKind::UnorderedList => return toggle_list(document, range, false),
        CommandKind::Heading(level) => {
            let kind = match level {
                0 => BlockKind::Paragraph,
                1..=6 => BlockKind::Heading { level: *level },
                _ => {
                    return Err(EditorError::InvalidValue(format!(
                        "heading level {}",
                        level
                    )))
                }
            };
            document.update_format(range, |format| format.kind = kind)?;
            return Ok(CommandOutcome::Applied);
        }
        CommandKind::CreateLink(url) => {
            if range.is_collapsed() {
                return Err(EditorError::EmptySelection);
            }
            let url = url.trim();
            if url.is_empty() {
                return Err(EditorError::InvalidValue("empty link target".into()));
            }
            document.update_style(range, |style| style.link = Some(url.to_string()))?;
            return Ok(CommandOutcome::Applied);
        }
        CommandKind::Unlink => {
            let target = if range.is_collapsed() {
                document.link_range_at(range.start())
            } else {
                Some(range)
            };
            if let Some(target) = target {
                document.update_style(target, |style| style.link = None)?;
            }
            return Ok(CommandOutcome::Applied);
        }
    };

    if range.is_collapsed() {
        let mut style = typing.clone();
        let flag_on = match &edit {
            StyleEdit::Toggle(flag) => !style.flag(*flag),
            _ => true,
        };
        edit.apply(&mut style, flag_on);
        return Ok(CommandOutcome::TypingStyle(style));
    }

    let flag_on = match &edit {
        StyleEdit::Toggle(flag) => !document.range_all(range, |style| style.flag(*flag)),
        _ => true,
    };
    document.update_style(range, |style| edit.apply(style, flag_on))?;
    Ok(CommandOutcome::Applied)
}

fn align(document: &mut Document, range: TextRange, align: Alignment) -> EditorResult<CommandOutcome> {
    document.update_format(range, |format| format.align = align)?;
    Ok(CommandOutcome::Applied)
}

/// Turns the touched blocks into list items, or back into paragraphs when
/// they already all are items of this kind.
fn toggle_list(document: &mut Document, range: TextRange, ordered: bool) -> EditorResult<CommandOutcome> {
    let target = BlockKind::ListItem { ordered };
    let all_listed = document
        .text_blocks_in(range)
        .iter()
        .all(|block| block.format.kind == target);
    let kind = if all_listed {
        BlockKind::Paragraph
    } else {
        target
    };
    document.update_format(range, |format| format.kind = kind)?;
    Ok(CommandOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_model::{Position, TextBlock};

    fn range(a: (usize, usize), b: (usize, usize)) -> TextRange {
        TextRange::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    fn run(doc: &mut Document, command: CommandKind, r: TextRange) -> EditorResult<CommandOutcome> {
        execute(&command, doc, r, &InlineStyle::default())
    }

    fn block(doc: &Document, ix: usize) -> &TextBlock {
        doc.text_block(ix).unwrap()
    }

    #[test]
    fn test_parse_toolbar_intents() {
        assert_eq!(CommandKind::parse("bold", None), Ok(CommandKind::Bold));
        assert_eq!(CommandKind::parse("olist", None), Ok(CommandKind::OrderedList));
        assert_eq!(
            CommandKind::parse("font-size", Some("20px")),
            Ok(CommandKind::FontSize(20))
        );
        assert_eq!(
            CommandKind::parse("heading", Some("h2")),
            Ok(CommandKind::Heading(2))
        );
        assert_eq!(
            CommandKind::parse("heading", Some("p")),
            Ok(CommandKind::Heading(0))
        );
        assert_eq!(
            CommandKind::parse("create-link", None),
            Err(CommandError::MissingValue("create-link".into()))
        );
        assert_eq!(
            CommandKind::parse("blink", None),
            Err(CommandError::UnknownCommand("blink".into()))
        );
        assert!(matches!(
            CommandKind::parse("font-size", Some("big")),
            Err(CommandError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_bold_toggles() {
        let mut doc = Document::from_plain_text("hello world");
        let r = range((0, 0), (0, 5));
        run(&mut doc, CommandKind::Bold, r).unwrap();
        assert!(doc.range_all(r, |s| s.bold));
        assert!(!doc.style_at(Position::new(0, 7)).bold);

        run(&mut doc, CommandKind::Bold, r).unwrap();
        assert!(doc.range_all(r, |s| !s.bold));
    }

    #[test]
    fn test_bold_partial_range_turns_on() {
        let mut doc = Document::from_plain_text("hello world");
        run(&mut doc, CommandKind::Bold, range((0, 0), (0, 3))).unwrap();
        let wide = range((0, 0), (0, 8));
        run(&mut doc, CommandKind::Bold, wide).unwrap();
        assert!(doc.range_all(wide, |s| s.bold));
    }

    #[test]
    fn test_collapsed_inline_sets_typing_style() {
        let mut doc = Document::from_plain_text("abc");
        let before = doc.clone();
        let caret = TextRange::collapsed(Position::new(0, 1));
        let outcome = run(&mut doc, CommandKind::Italic, caret).unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::TypingStyle(InlineStyle {
                italic: true,
                ..InlineStyle::default()
            })
        );
        assert_eq!(doc, before);
    }

    #[test]
    fn test_font_size_maps_to_ordinal() {
        let mut doc = Document::from_plain_text("abc");
        let r = range((0, 0), (0, 3));
        run(&mut doc, CommandKind::FontSize(20), r).unwrap();
        assert_eq!(doc.style_at(Position::new(0, 1)).size.map(|s| s.ordinal()), Some(4));
        run(&mut doc, CommandKind::FontSize(100), r).unwrap();
        assert_eq!(doc.style_at(Position::new(0, 1)).size.map(|s| s.ordinal()), Some(7));
    }

    #[test]
    fn test_colors_validated() {
        let mut doc = Document::from_plain_text("abc");
        let before = doc.clone();
        let r = range((0, 0), (0, 3));
        assert!(matches!(
            run(&mut doc, CommandKind::TextColor("red".into()), r),
            Err(EditorError::InvalidValue(_))
        ));
        assert_eq!(doc, before);

        run(&mut doc, CommandKind::HighlightColor("#FF0".into()), r).unwrap();
        assert_eq!(
            doc.style_at(Position::new(0, 1)).highlight.map(|c| c.to_string()),
            Some("#ffff00".to_string())
        );
    }

    #[test]
    fn test_alignment_and_indent_on_collapsed_caret() {
        let mut doc = Document::from_plain_text("one\ntwo");
        let caret = TextRange::collapsed(Position::new(1, 0));
        run(&mut doc, CommandKind::JustifyCenter, caret).unwrap();
        assert_eq!(block(&doc, 1).format.align, Alignment::Center);
        assert_eq!(block(&doc, 0).format.align, Alignment::Left);

        run(&mut doc, CommandKind::Outdent, caret).unwrap();
        assert_eq!(block(&doc, 1).format.indent, 0);
        for _ in 0..20 {
            run(&mut doc, CommandKind::Indent, caret).unwrap();
        }
        assert_eq!(block(&doc, 1).format.indent, MAX_INDENT);
    }

    #[test]
    fn test_list_toggle() {
        let mut doc = Document::from_plain_text("a\nb\nc");
        let r = range((0, 0), (1, 1));
        run(&mut doc, CommandKind::UnorderedList, r).unwrap();
        assert_eq!(block(&doc, 0).format.kind, BlockKind::ListItem { ordered: false });
        assert_eq!(block(&doc, 1).format.kind, BlockKind::ListItem { ordered: false });
        assert_eq!(block(&doc, 2).format.kind, BlockKind::Paragraph);

        // Switching list kind converts, repeating it reverts
        run(&mut doc, CommandKind::OrderedList, r).unwrap();
        assert_eq!(block(&doc, 0).format.kind, BlockKind::ListItem { ordered: true });
        run(&mut doc, CommandKind::OrderedList, r).unwrap();
        assert_eq!(block(&doc, 0).format.kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_heading_levels() {
        let mut doc = Document::from_plain_text("title");
        let caret = TextRange::collapsed(Position::zero());
        run(&mut doc, CommandKind::Heading(2), caret).unwrap();
        assert_eq!(block(&doc, 0).format.kind, BlockKind::Heading { level: 2 });
        run(&mut doc, CommandKind::Heading(0), caret).unwrap();
        assert_eq!(block(&doc, 0).format.kind, BlockKind::Paragraph);
        assert!(matches!(
            run(&mut doc, CommandKind::Heading(9), caret),
            Err(EditorError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_create_link_exact_range() {
        let mut doc = Document::from_plain_text("see the docs here");
        let r = range((0, 8), (0, 12));
        run(&mut doc, CommandKind::CreateLink("https://x.test".into()), r).unwrap();

        assert_eq!(doc.link_range_at(Position::new(0, 9)), Some(r));
        assert_eq!(doc.style_at(Position::new(0, 8)).link, None);
        assert_eq!(doc.style_at(Position::new(0, 13)).link, None);
    }

    #[test]
    fn test_create_link_errors() {
        let mut doc = Document::from_plain_text("abc");
        let caret = TextRange::collapsed(Position::new(0, 1));
        assert!(matches!(
            run(&mut doc, CommandKind::CreateLink("https://x.test".into()), caret),
            Err(EditorError::EmptySelection)
        ));
        assert!(matches!(
            run(&mut doc, CommandKind::CreateLink("  ".into()), range((0, 0), (0, 2))),
            Err(EditorError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_unlink_collapsed_removes_whole_link() {
        let mut doc = Document::from_plain_text("a link here");
        let link = range((0, 2), (0, 6));
        run(&mut doc, CommandKind::CreateLink("https://x.test".into()), link).unwrap();
        run(&mut doc, CommandKind::Unlink, TextRange::collapsed(Position::new(0, 4))).unwrap();
        assert_eq!(doc.link_range_at(Position::new(0, 4)), None);
    }

    #[test]
    fn test_remove_formatting_clears_links_and_styles() {
        let mut doc = Document::from_plain_text("styled");
        let r = range((0, 0), (0, 6));
        run(&mut doc, CommandKind::Bold, r).unwrap();
        run(&mut doc, CommandKind::TextColor("#123456".into()), r).unwrap();
        run(&mut doc, CommandKind::CreateLink("https://x.test".into()), r).unwrap();

        run(&mut doc, CommandKind::RemoveFormatting, r).unwrap();
        assert!(doc.range_all(r, InlineStyle::is_default));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut doc = Document::from_plain_text("abc");
        assert!(matches!(
            run(&mut doc, CommandKind::Bold, range((0, 0), (3, 0))),
            Err(EditorError::InvalidPosition(_))
        ));
    }
}
