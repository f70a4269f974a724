//! Turn an assistant reply into styled ratatui lines: prose through the
//! inline formatter, fenced code through syntect.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Style as SynStyle, ThemeSet};
use syntect::parsing::SyntaxSet;

use charla_core::{format_line, segment, InlineStyle, Segment};

// Syntax highlighting resources (loaded once)
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const TEXT_COLOR: Color = Color::Rgb(200, 200, 195);
const BOLD_COLOR: Color = Color::Rgb(240, 240, 235);
const CODE_FG: Color = Color::Rgb(180, 180, 180);
const CODE_BG: Color = Color::Rgb(45, 45, 45);
const DIM_COLOR: Color = Color::Rgb(100, 100, 100);

/// Render one reply as chat lines: prose lines with inline styling, code
/// segments framed by `┌─ lang` / `│` / `└─` borders.
pub fn message_lines(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for seg in segment(text) {
        match seg {
            Segment::Prose { text } => {
                for line in text.lines() {
                    lines.push(prose_line(line));
                }
            }
            Segment::Code { language, text } => {
                lines.push(Line::from(Span::styled(
                    format!("┌─ {} ", language),
                    Style::default().fg(DIM_COLOR),
                )));
                for hl_line in highlight_code(&text, &language) {
                    let mut spans = vec![Span::styled("│ ", Style::default().fg(DIM_COLOR))];
                    spans.extend(hl_line.spans);
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(Span::styled(
                    "└─",
                    Style::default().fg(DIM_COLOR),
                )));
            }
        }
    }

    lines
}

/// One prose line through the inline rules, mapped to terminal styles.
/// A blank line becomes an explicit empty line.
fn prose_line(line: &str) -> Line<'static> {
    let spans: Vec<Span<'static>> = format_line(line)
        .into_iter()
        .map(|span| {
            let style = match span.style {
                InlineStyle::Plain => Style::default().fg(TEXT_COLOR),
                InlineStyle::Bold => Style::default()
                    .fg(BOLD_COLOR)
                    .add_modifier(Modifier::BOLD),
                InlineStyle::Italic => Style::default()
                    .fg(TEXT_COLOR)
                    .add_modifier(Modifier::ITALIC),
                InlineStyle::Code => Style::default().fg(CODE_FG).bg(CODE_BG),
            };
            Span::styled(span.text, style)
        })
        .collect();

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn highlight_code(code: &str, language: &str) -> Vec<Line<'static>> {
    let syntax = SYNTAX_SET
        .find_syntax_by_token(language)
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
    let theme = &THEME_SET.themes["base16-ocean.dark"];
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut lines = Vec::new();
    for line in code.lines() {
        match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => {
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .map(|(style, text)| {
                        Span::styled(text.to_string(), syntect_to_ratatui_style(style))
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
            Err(_) => {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(CODE_FG),
                )));
            }
        }
    }
    lines
}

fn syntect_to_ratatui_style(style: SynStyle) -> Style {
    let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
    Style::default().fg(fg)
}

/// The text of the last fenced code block in `text`, for the clipboard.
pub fn last_code_block(text: &str) -> Option<String> {
    segment(text).into_iter().rev().find_map(|seg| match seg {
        Segment::Code { text, .. } => Some(text),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_to_string(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn prose_and_code_render_in_order() {
        let lines = message_lines("intro\n```rust\nfn main() {}\n```");
        let rendered: Vec<String> = lines.iter().map(line_to_string).collect();

        assert_eq!(rendered[0], "intro");
        assert!(rendered[1].starts_with("┌─ rust"));
        assert!(rendered[2].starts_with("│ ") && rendered[2].contains("fn main()"));
        assert_eq!(rendered[3], "└─");
    }

    #[test]
    fn bold_text_gets_bold_modifier() {
        let lines = message_lines("**Hi** there");
        assert_eq!(lines.len(), 1);
        let bold = &lines[0].spans[0];
        assert_eq!(bold.content.as_ref(), "Hi");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(lines[0].spans[1].content.as_ref(), " there");
    }

    #[test]
    fn blank_prose_line_is_preserved_as_break() {
        let lines = message_lines("one\n\ntwo");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].spans.is_empty());
    }

    #[test]
    fn unknown_language_still_renders() {
        let lines = message_lines("```nosuchlang\nx\n```");
        let rendered: Vec<String> = lines.iter().map(line_to_string).collect();
        assert!(rendered.iter().any(|l| l.contains('x')));
    }

    #[test]
    fn last_code_block_picks_the_final_fence() {
        let text = "```a\nfirst\n```\nwords\n```b\nsecond\n```";
        assert_eq!(last_code_block(text).as_deref(), Some("second"));
        assert_eq!(last_code_block("no fences"), None);
    }
}
