//! Splitting an AI reply into prose and fenced-code segments, plus the
//! small fixed set of inline formatting rules applied to prose lines.
//!
//! Both operations are best-effort and never fail: malformed input (an
//! unterminated fence, unmatched delimiters) degrades to something sensible
//! instead of erroring.

use regex::Regex;
use std::sync::LazyLock;

/// Fence tag used when the opener names no language.
pub const DEFAULT_LANGUAGE: &str = "plaintext";

/// A contiguous run of either prose or fenced code from a reply.
///
/// Segments are derived on each render and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Prose { text: String },
    Code { language: String, text: String },
}

/// Split `text` into prose and code segments in first-appearance order.
///
/// A line starting with ``` toggles fence state; the rest of the opening
/// line (trimmed) names the language. An unterminated fence at end of input
/// is emitted as a final code segment rather than dropped, so user content
/// is never lost. Adjacent segments of the same kind are not merged, and
/// empty fence pairs yield zero-length code segments.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut prose: Vec<&str> = Vec::new();
    let mut code: Vec<&str> = Vec::new();
    let mut language: Option<String> = None;

    for line in text.lines() {
        if line.starts_with("```") {
            match language.take() {
                None => {
                    // Opening fence
                    if !prose.is_empty() {
                        segments.push(Segment::Prose {
                            text: prose.join("\n"),
                        });
                        prose.clear();
                    }
                    let tag = line[3..].trim();
                    language = Some(if tag.is_empty() {
                        DEFAULT_LANGUAGE.to_string()
                    } else {
                        tag.to_string()
                    });
                }
                Some(lang) => {
                    // Closing fence
                    segments.push(Segment::Code {
                        language: lang,
                        text: code.join("\n"),
                    });
                    code.clear();
                }
            }
        } else if language.is_some() {
            code.push(line);
        } else {
            prose.push(line);
        }
    }

    // A dangling fence closes implicitly; the buffer is kept, not dropped.
    if let Some(lang) = language {
        segments.push(Segment::Code {
            language: lang,
            text: code.join("\n"),
        });
    } else if !prose.is_empty() {
        segments.push(Segment::Prose {
            text: prose.join("\n"),
        });
    }

    segments
}

/// Inline formatting applied to a span of prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineStyle {
    Plain,
    Bold,
    Italic,
    Code,
}

/// A typed run of text within one prose line.
///
/// Styling lives in the type rather than in the text, so raw reply text can
/// never be interpreted as active markup by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub style: InlineStyle,
    pub text: String,
}

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.*?)`").unwrap());

/// Apply the inline rules to one prose line: `**bold**`, then `*italic*`,
/// then `` `code` ``, in that order, each exactly once.
///
/// Each rule rewrites only spans still marked `Plain`; output of an earlier
/// rule is never re-scanned, so `***x***` resolves as bold before the
/// italic rule can partially consume the run. Unmatched delimiters stay
/// literal. A blank line yields an empty span list.
pub fn format_line(line: &str) -> Vec<InlineSpan> {
    let mut spans = vec![InlineSpan {
        style: InlineStyle::Plain,
        text: line.to_string(),
    }];
    spans = apply_rule(spans, &BOLD_RE, InlineStyle::Bold);
    spans = apply_rule(spans, &ITALIC_RE, InlineStyle::Italic);
    spans = apply_rule(spans, &CODE_RE, InlineStyle::Code);
    spans.retain(|s| !s.text.is_empty());
    spans
}

fn apply_rule(spans: Vec<InlineSpan>, rule: &Regex, style: InlineStyle) -> Vec<InlineSpan> {
    let mut out = Vec::with_capacity(spans.len());

    for span in spans {
        if span.style != InlineStyle::Plain {
            out.push(span);
            continue;
        }

        let mut last = 0;
        for caps in rule.captures_iter(&span.text) {
            let whole = caps.get(0).unwrap();
            let inner = caps.get(1).unwrap();
            if whole.start() > last {
                out.push(InlineSpan {
                    style: InlineStyle::Plain,
                    text: span.text[last..whole.start()].to_string(),
                });
            }
            out.push(InlineSpan {
                style,
                text: inner.as_str().to_string(),
            });
            last = whole.end();
        }
        if last < span.text.len() {
            out.push(InlineSpan {
                style: InlineStyle::Plain,
                text: span.text[last..].to_string(),
            });
        }
    }

    out
}
