//! Text canonicalization and argument extraction over raw message content.

pub mod args;
pub mod normalize;

pub use args::ParsedArguments;
pub use normalize::{TextNormalizer, WakeWord};

/// Locate the first quoted span in `text`: the first `'` or `"` and the next
/// occurrence of the same quote character. Returns the byte range including
/// the quotes and the inner content.
pub(crate) fn find_quoted_span(text: &str) -> Option<(std::ops::Range<usize>, &str)> {
    for (open, quote) in text.char_indices().filter(|(_, c)| *c == '\'' || *c == '"') {
        if let Some(close_rel) = text[open + 1..].find(quote) {
            let close = open + 1 + close_rel;
            return Some((open..close + 1, &text[open + 1..close]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::find_quoted_span;

    #[test]
    fn quoted_span_double_quotes() {
        let (range, inner) = find_quoted_span(r#"busca "Bohemian Rhapsody" ya"#).unwrap();
        assert_eq!(inner, "Bohemian Rhapsody");
        assert_eq!(range, 6..25);
    }

    #[test]
    fn quoted_span_requires_matching_pair() {
        // A lone opening quote never closes.
        assert!(find_quoted_span("pon 'sin cierre").is_none());
        // Mismatched quote characters do not pair up.
        assert!(find_quoted_span(r#"pon 'mezclada" rara"#).is_none());
    }

    #[test]
    fn quoted_span_skips_unpaired_opening_quote() {
        let (_, inner) = find_quoted_span(r#"don't say "hola""#).unwrap();
        assert_eq!(inner, "hola");
    }

    #[test]
    fn quoted_span_picks_first_pair() {
        let (_, inner) = find_quoted_span(r#"di 'uno' y "dos""#).unwrap();
        assert_eq!(inner, "uno");
    }
}
