//! FAQ answer highlight markup
//!
//! Answers may embed `` color`text` `` spans, e.g. ``green`$0` ``. This
//! module splits an answer into plain and highlighted segments; anything
//! malformed degrades to plain text instead of erroring.

use regex::Regex;
use std::sync::OnceLock;

/// A rendered piece of an FAQ answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    Highlight { color: String, text: String },
}

fn span_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([A-Za-z]+)`([^`]*)`").expect("valid highlight pattern"))
}

/// Parse an answer into display segments
pub fn parse_answer(answer: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in span_pattern().captures_iter(answer) {
        let whole = caps.get(0).expect("capture 0 always present");
        if whole.start() > cursor {
            segments.push(Segment::Plain(answer[cursor..whole.start()].to_string()));
        }
        segments.push(Segment::Highlight {
            color: caps[1].to_lowercase(),
            text: caps[2].to_string(),
        });
        cursor = whole.end();
    }

    if cursor < answer.len() {
        segments.push(Segment::Plain(answer[cursor..].to_string()));
    }

    segments
}

/// Flatten an answer back to plain text, dropping the markup
pub fn strip_markup(answer: &str) -> String {
    parse_answer(answer)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text,
            Segment::Highlight { text, .. } => text,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_answer_is_one_segment() {
        let segments = parse_answer("No markup here.");
        assert_eq!(segments, vec![Segment::Plain("No markup here.".to_string())]);
    }

    #[test]
    fn test_highlight_span_is_extracted() {
        let segments = parse_answer("Hosting starts at green`$0` per month.");
        assert_eq!(
            segments,
            vec![
                Segment::Plain("Hosting starts at ".to_string()),
                Segment::Highlight {
                    color: "green".to_string(),
                    text: "$0".to_string()
                },
                Segment::Plain(" per month.".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_markup_stays_plain() {
        let segments = parse_answer("broken red`span");
        assert_eq!(segments, vec![Segment::Plain("broken red`span".to_string())]);
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(
            strip_markup("pay green`$0` now, blue`$5` later"),
            "pay $0 now, $5 later"
        );
    }
}
