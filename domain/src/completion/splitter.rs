//! Reasoning extraction from raw completion text.
//!
//! Uses a plain forward scan for the delimiter pair: the first complete pair
//! supplies the reasoning, and complete pairs are cut out of the visible text
//! until none remain. An opening marker without a matching close is left in place.

use super::CompletionResult;
use std::ops::Range;

/// Opening and closing markers around a reasoning block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningDelimiters {
    pub open: String,
    pub close: String,
}

impl ReasoningDelimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

impl Default for ReasoningDelimiters {
    fn default() -> Self {
        Self::new("<thinking>", "</thinking>")
    }
}

/// Split `raw` into visible answer and reasoning using the default
/// `<thinking>` delimiters.
pub fn split_reasoning(raw: &str) -> CompletionResult {
    split_reasoning_with(raw, &ReasoningDelimiters::default())
}

/// Split `raw` into visible answer and reasoning.
pub fn split_reasoning_with(raw: &str, delimiters: &ReasoningDelimiters) -> CompletionResult {
    let Some((mut visible, inner)) = cut_pairs(raw, delimiters) else {
        return CompletionResult {
            visible_text: raw.trim().to_string(),
            reasoning_text: String::new(),
            reasoning_found: false,
        };
    };

    // Cutting a pair can splice the leftovers into a new complete pair.
    while let Some((rest, _)) = cut_pairs(&visible, delimiters) {
        visible = rest;
    }

    CompletionResult {
        visible_text: visible.trim().to_string(),
        reasoning_text: raw[inner].trim().to_string(),
        reasoning_found: true,
    }
}

/// Remove every complete pair from `text` in one forward pass.
///
/// Returns the remaining text and the byte range inside the first pair, or
/// `None` when `text` holds no complete pair.
fn cut_pairs(text: &str, delimiters: &ReasoningDelimiters) -> Option<(String, Range<usize>)> {
    let open = delimiters.open.as_str();
    let close = delimiters.close.as_str();

    let mut visible = String::with_capacity(text.len());
    let mut first: Option<Range<usize>> = None;
    let mut cursor = 0;

    while let Some(start) = find_from(text, open, cursor) {
        let inner_start = start + open.len();
        let Some(end) = find_from(text, close, inner_start) else {
            break;
        };
        if first.is_none() {
            first = Some(inner_start..end);
        }
        visible.push_str(&text[cursor..start]);
        cursor = end + close.len();
    }
    visible.push_str(&text[cursor..]);

    first.map(|inner| (visible, inner))
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_embedded_block() {
        let result = split_reasoning("A<thinking>B</thinking>C");
        assert_eq!(result.visible_text, "AC");
        assert_eq!(result.reasoning_text, "B");
        assert!(result.reasoning_found);
    }

    #[test]
    fn test_leading_block_with_whitespace() {
        let result = split_reasoning("<thinking>\n  add the numbers \n</thinking>\n\n4\n");
        assert_eq!(result.visible_text, "4");
        assert_eq!(result.reasoning_text, "add the numbers");
    }

    #[test]
    fn test_no_delimiters() {
        let result = split_reasoning("  plain answer \n");
        assert_eq!(result.visible_text, "plain answer");
        assert_eq!(result.reasoning_text, "");
        assert!(!result.reasoning_found);
    }

    #[test]
    fn test_unclosed_delimiter_is_not_extracted() {
        let result = split_reasoning("A<thinking>B");
        assert_eq!(result.visible_text, "A<thinking>B");
        assert_eq!(result.reasoning_text, "");
        assert!(!result.reasoning_found);
    }

    #[test]
    fn test_empty_block_is_present() {
        let result = split_reasoning("<thinking></thinking> answer");
        assert_eq!(result.visible_text, "answer");
        assert_eq!(result.reasoning_text, "");
        assert!(result.reasoning_found);
        assert_eq!(result.reasoning(), Some(""));
    }

    #[test]
    fn test_first_pair_wins() {
        let result = split_reasoning("<thinking>one</thinking>X<thinking>two</thinking>Y");
        assert_eq!(result.reasoning_text, "one");
        assert_eq!(result.visible_text, "XY");
    }

    #[test]
    fn test_multiline_reasoning() {
        let raw = "<thinking>line 1\nline 2</thinking>\nDone.";
        let result = split_reasoning(raw);
        assert_eq!(result.reasoning_text, "line 1\nline 2");
        assert_eq!(result.visible_text, "Done.");
    }

    #[test]
    fn test_splitting_visible_text_again_is_stable() {
        let inputs = [
            "A<thinking>B</thinking>C",
            "<thinking>x</thinking> y <thinking>z</thinking> w",
            "no markers at all",
            "open only <thinking> here",
            "close only </thinking> here",
            "<thinking></thinking>",
            "<think<thinking>x</thinking>ing>y</thinking>",
        ];
        for input in inputs {
            let first = split_reasoning(input);
            let second = split_reasoning(&first.visible_text);
            assert_eq!(second.reasoning_text, "", "input: {input}");
            assert!(!second.reasoning_found, "input: {input}");
            assert_eq!(second.visible_text, first.visible_text, "input: {input}");
        }
    }

    #[test]
    fn test_spliced_pair_is_removed_too() {
        let result = split_reasoning("<think<thinking>x</thinking>ing>y</thinking> done");
        assert_eq!(result.reasoning_text, "x");
        assert_eq!(result.visible_text, "done");
    }

    #[test]
    fn test_close_before_open_is_ignored() {
        let result = split_reasoning("</thinking>A<thinking>B");
        assert!(!result.reasoning_found);
        assert_eq!(result.visible_text, "</thinking>A<thinking>B");
    }

    #[test]
    fn test_custom_delimiters() {
        let delimiters = ReasoningDelimiters::new("[[", "]]");
        let result = split_reasoning_with("answer [[why]]", &delimiters);
        assert_eq!(result.visible_text, "answer");
        assert_eq!(result.reasoning_text, "why");
    }

    #[test]
    fn test_multibyte_text_around_markers() {
        let result = split_reasoning("答え<thinking>計算する</thinking>は4です");
        assert_eq!(result.visible_text, "答えは4です");
        assert_eq!(result.reasoning_text, "計算する");
    }
}
