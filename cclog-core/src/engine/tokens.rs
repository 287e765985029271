//! Token estimation and conversation-size aggregation.

use super::arena::Arena;
use crate::types::NodeIdx;

/// Rough output-token estimate for a piece of rendered text.
///
/// Markup tags are dropped, the remaining words are counted and scaled by
/// 1.3 (truncated).
pub fn estimate_tokens(text: &str) -> u64 {
    let words = count_words(&strip_markup(text)) as u64;
    words * 13 / 10
}

/// Remove every `<...>` span. An unclosed `<` is kept as text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        out.push_str(&rest[..open]);
        out.push(' ');
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

/// Words are maximal runs of characters that are neither whitespace nor
/// punctuation.
pub fn count_words(text: &str) -> usize {
    text.split(is_word_separator)
        .filter(|w| !w.is_empty())
        .count()
}

fn is_word_separator(c: char) -> bool {
    if c.is_whitespace() || c.is_ascii_punctuation() {
        return true;
    }
    // Latin-1 symbols, general punctuation, CJK and fullwidth punctuation
    matches!(c,
        '\u{00A1}'..='\u{00BF}'
        | '\u{2010}'..='\u{205E}'
        | '\u{3001}'..='\u{303F}'
        | '\u{FE30}'..='\u{FE6F}'
        | '\u{FF01}'..='\u{FF0F}'
        | '\u{FF1A}'..='\u{FF20}'
        | '\u{FF3B}'..='\u{FF40}'
        | '\u{FF5B}'..='\u{FF65}'
    ) && !c.is_alphanumeric()
}

/// Set `tokens.total` on every node reachable from `roots`.
pub fn aggregate(arena: &mut Arena, roots: &[NodeIdx], include_output: bool) {
    for idx in arena.reachable_from(roots) {
        let tokens = &mut arena[idx].tokens;
        tokens.total = tokens.context_size();
        if include_output {
            tokens.total += tokens.output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Invocation, Node, TokenUsage};

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("Hello"), 1);
        // 10 words -> 13 tokens
        assert_eq!(estimate_tokens("one two three four five six seven eight nine ten"), 13);
        // 3 words -> 3.9 truncated
        assert_eq!(estimate_tokens("a, b. c!"), 3);
    }

    #[test]
    fn test_markup_is_not_counted() {
        assert_eq!(
            estimate_tokens("<command-name>/clear</command-name>"),
            estimate_tokens("clear")
        );
        assert_eq!(strip_markup("a <b> c"), "a   c");
        assert_eq!(strip_markup("x < y"), "x < y");
    }

    #[test]
    fn test_count_words_splits_on_punctuation() {
        assert_eq!(count_words("don't stop-me"), 4);
        assert_eq!(count_words("   "), 0);
    }

    #[test]
    fn test_count_words_splits_on_unicode_punctuation() {
        assert_eq!(count_words("a\u{2014}b"), 2);
        assert_eq!(count_words("\u{201C}quoted\u{201D}text\u{3002}"), 2);
        assert_eq!(count_words("\u{00BF}qu\u{00E9}?"), 1);
        assert_eq!(count_words("caf\u{00E9} na\u{00EF}ve \u{00B2}"), 3);
        assert_eq!(count_words("\u{6F22}\u{5B57}\u{3001}\u{304B}\u{306A}"), 2);
    }

    fn usage_node(uuid: &str, input: u64, output: u64) -> Node {
        Node {
            uuid: uuid.to_string(),
            tokens: TokenUsage {
                input,
                output,
                cache_read: 20,
                cache_creation: 5,
                total: 0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_aggregate_excludes_output_by_default() {
        let mut arena = Arena::default();
        let root = arena.push(usage_node("a", 100, 999));
        aggregate(&mut arena, &[root], false);
        assert_eq!(arena[root].tokens.total, 125);

        aggregate(&mut arena, &[root], true);
        assert_eq!(arena[root].tokens.total, 1124);
    }

    #[test]
    fn test_aggregate_reaches_results_and_skips_unreachable() {
        let mut arena = Arena::default();
        let root = arena.push(usage_node("a", 1, 0));
        let result = arena.push(usage_node("b", 2, 0));
        let orphan = arena.push(usage_node("c", 3, 0));
        arena[root].invocations.push(Invocation {
            result: Some(result),
            ..Default::default()
        });

        aggregate(&mut arena, &[root], false);
        assert_eq!(arena[root].tokens.total, 26);
        assert_eq!(arena[result].tokens.total, 27);
        assert_eq!(arena[orphan].tokens.total, 0);
    }
}
