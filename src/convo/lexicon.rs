//! Lexicon loading and nearest-pattern classification.
//!
//! The lexicon is an ordered list of (normalized pattern, payload) pairs.
//! Classification finds the entry with the minimum edit distance to the
//! normalized input; ties break to the earliest-loaded entry. There is no
//! distance threshold here — gating very distant matches is the dispatcher's
//! policy decision.

use crate::error::LexiconError;
use crate::text::TextNormalizer;
use serde::Deserialize;
use std::path::Path;

/// What a matched pattern resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Canned responses; one is sent verbatim, chosen at random.
    Dialog(Vec<String>),
    /// Named intention dispatched through the registry.
    Intention(String),
}

/// One normalized pattern and its payload. Immutable after load.
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    pub pattern: String,
    pub payload: Payload,
}

/// Result of classifying one input against the lexicon.
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub entry: &'a LexiconEntry,
    pub distance: usize,
}

/// Ordered collection of lexicon entries.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

/// One source record: a question (or list of question variants) plus exactly
/// one payload.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(alias = "pattern")]
    patterns: OneOrMany,
    intent: Option<String>,
    dialog: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct RawLexicon {
    entries: Vec<RawEntry>,
}

impl Lexicon {
    /// Load one lexicon file, appending its records in order. Every pattern
    /// variant of a record becomes a separate entry sharing the payload.
    /// Any failure here is fatal at startup.
    pub fn load_file(
        &mut self,
        path: &Path,
        normalizer: &TextNormalizer,
    ) -> Result<(), LexiconError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Load {
            path: display.clone(),
            source: std::sync::Arc::new(source),
        })?;
        self.load_str(&content, &display, normalizer)
    }

    pub(crate) fn load_str(
        &mut self,
        content: &str,
        origin: &str,
        normalizer: &TextNormalizer,
    ) -> Result<(), LexiconError> {
        let raw: RawLexicon = toml::from_str(content).map_err(|source| LexiconError::Parse {
            path: origin.to_string(),
            source: Box::new(source),
        })?;

        for (index, record) in raw.entries.into_iter().enumerate() {
            let payload = match (record.intent, record.dialog) {
                (Some(intent), None) => Payload::Intention(intent),
                (None, Some(dialog)) if !dialog.is_empty() => Payload::Dialog(dialog),
                (None, Some(_)) => {
                    return Err(LexiconError::InvalidEntry {
                        path: origin.to_string(),
                        index,
                        reason: "dialog payload is empty".into(),
                    });
                }
                (Some(_), Some(_)) => {
                    return Err(LexiconError::InvalidEntry {
                        path: origin.to_string(),
                        index,
                        reason: "record has both intent and dialog payloads".into(),
                    });
                }
                (None, None) => {
                    return Err(LexiconError::InvalidEntry {
                        path: origin.to_string(),
                        index,
                        reason: "record has neither intent nor dialog payload".into(),
                    });
                }
            };

            let patterns = match record.patterns {
                OneOrMany::One(question) => vec![question],
                OneOrMany::Many(questions) => questions,
            };
            for question in patterns {
                self.entries.push(LexiconEntry {
                    pattern: normalizer.normalize(&question),
                    payload: payload.clone(),
                });
            }
        }

        Ok(())
    }

    /// Startup guard: a bot with no patterns answers nothing, so an empty
    /// lexicon after loading every source is fatal.
    pub fn ensure_non_empty(&self) -> Result<(), LexiconError> {
        if self.entries.is_empty() {
            return Err(LexiconError::Empty);
        }
        Ok(())
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Select the entry closest to the already-normalized input by edit
    /// distance. The running minimum uses strict less-than, so the first
    /// entry achieving the minimum wins ties. Returns `None` only for an
    /// empty lexicon, which load-time validation rules out.
    pub fn classify(&self, normalized: &str) -> Option<Classification<'_>> {
        let mut best: Option<Classification<'_>> = None;
        for entry in &self.entries {
            let distance = levenshtein(&entry.pattern, normalized);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(Classification { entry, distance });
            }
        }
        best
    }
}

/// Edit distance with unit cost for insert, delete, and substitute.
/// Two-row dynamic program over chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::{Lexicon, Payload, levenshtein};
    use crate::text::{TextNormalizer, WakeWord};
    use indoc::indoc;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::new(WakeWord::new("eri"))
    }

    fn lexicon_from(content: &str) -> Lexicon {
        let mut lexicon = Lexicon::default();
        lexicon
            .load_str(content, "test.toml", &normalizer())
            .expect("fixture parses");
        lexicon
    }

    #[test]
    fn levenshtein_basics() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("pon musica", "pon muscia"), 2);
    }

    #[test]
    fn list_of_questions_expands_to_entries_sharing_payload() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            patterns = ["eri pon musica", "eri reproduce musica"]
            intent = "play_song"
        "#});
        assert_eq!(lexicon.len(), 2);
        let hit = lexicon.classify("pon musica").unwrap();
        assert_eq!(hit.entry.payload, Payload::Intention("play_song".into()));
        assert_eq!(hit.distance, 0);
    }

    #[test]
    fn single_pattern_alias_accepted() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            pattern = "hola eri"
            dialog = ["hola!"]
        "#});
        assert_eq!(lexicon.len(), 1);
    }

    #[test]
    fn classification_is_deterministic() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            patterns = ["eri pon musica"]
            intent = "play_song"

            [[entries]]
            patterns = ["eri pausa la musica"]
            intent = "pause_song"
        "#});
        let first = lexicon.classify("pon musicaa").unwrap();
        for _ in 0..10 {
            let again = lexicon.classify("pon musicaa").unwrap();
            assert_eq!(again.entry.payload, first.entry.payload);
            assert_eq!(again.distance, first.distance);
        }
    }

    #[test]
    fn ties_break_to_earliest_entry() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            patterns = ["abcd"]
            intent = "first"

            [[entries]]
            patterns = ["abce"]
            intent = "second"
        "#});
        // "abcf" is distance 1 from both patterns.
        let hit = lexicon.classify("abcf").unwrap();
        assert_eq!(hit.entry.payload, Payload::Intention("first".into()));
        assert_eq!(hit.distance, 1);
    }

    #[test]
    fn always_returns_a_payload_even_for_distant_input() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            patterns = ["eri pon musica"]
            intent = "play_song"
        "#});
        assert!(lexicon.classify("texto totalmente distinto").is_some());
    }

    #[test]
    fn record_with_both_payload_kinds_is_rejected() {
        let mut lexicon = Lexicon::default();
        let result = lexicon.load_str(
            indoc! {r#"
                [[entries]]
                patterns = ["hola"]
                intent = "greet"
                dialog = ["hola!"]
            "#},
            "bad.toml",
            &normalizer(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unparseable_source_is_an_error() {
        let mut lexicon = Lexicon::default();
        assert!(
            lexicon
                .load_str("entries = 3", "bad.toml", &normalizer())
                .is_err()
        );
    }

    #[test]
    fn empty_lexicon_fails_the_startup_guard() {
        use crate::error::LexiconError;

        let lexicon = Lexicon::default();
        assert!(matches!(
            lexicon.ensure_non_empty(),
            Err(LexiconError::Empty)
        ));

        let loaded = lexicon_from(indoc! {r#"
            [[entries]]
            pattern = "hola"
            dialog = ["hola!"]
        "#});
        assert!(loaded.ensure_non_empty().is_ok());
    }

    #[test]
    fn patterns_are_normalized_on_load() {
        let lexicon = lexicon_from(indoc! {r#"
            [[entries]]
            patterns = ["¿Eri qué canción suena?"]
            intent = "now_playing"
        "#});
        let hit = lexicon.classify("que cancion suena").unwrap();
        assert_eq!(hit.distance, 0);
    }
}
